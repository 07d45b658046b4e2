//! Field validation for student records.
//!
//! The same rule set backs the add form, the edit form and the API boundary.
//! Rules are parameterized by [`ValidationMode`]: the only difference between
//! creating and updating a student is that the password becomes optional on
//! update (absent or blank means "keep the current credential").
//!
//! Nothing here fails: every check returns data, and aggregate checks return a
//! [`FieldErrors`] map that is empty when the input is valid.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    /// Roll numbers look like `AM.SC.U4CSE23029`
    static ref ROLLNO_REGEX: Regex = Regex::new(
        r"^AM\.(SC|SE|SB|SA|EN|CB)\.U[1-9][A-Z]{2,4}\d{5}$"
    ).unwrap();

    /// Institutional address derived from the lower-cased roll number
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^am\.(sc|se|sb|sa|en|cb)\.u[1-9][a-z]{2,4}\d{5}@am\.students\.amrita\.edu$"
    ).unwrap();

    /// Ten digits, leading 6-9
    static ref PHONE_REGEX: Regex = Regex::new(r"^[6-9]\d{9}$").unwrap();
}

pub const EMAIL_DOMAIN: &str = "@am.students.amrita.edu";

pub const MIN_PASSWORD_LEN: usize = 6;

pub const SIG_OPTIONS: [&str; 5] = ["WEB", "APP", "AI", "GLITCH", "CYBER"];

pub const ROLE_OPTIONS: [&str; 8] = [
    "CORE",
    "CO-LEAD",
    "LEAD",
    "CHAIRPERSON",
    "VICE-CHAIRPERSON",
    "WEB-MASTER",
    "SECRETARY",
    "MEMBER",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Editable student fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StudentField {
    Name,
    Rollno,
    Email,
    Phone,
    Password,
    Sig,
    Role,
}

impl StudentField {
    pub const ALL: [StudentField; 7] = [
        StudentField::Name,
        StudentField::Rollno,
        StudentField::Email,
        StudentField::Phone,
        StudentField::Password,
        StudentField::Sig,
        StudentField::Role,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentField::Name => "name",
            StudentField::Rollno => "rollno",
            StudentField::Email => "email",
            StudentField::Phone => "phone",
            StudentField::Password => "password",
            StudentField::Sig => "sig",
            StudentField::Role => "role",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for StudentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to message, one entry per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl IntoIterator for FieldErrors {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub fn is_valid_rollno(rollno: &str) -> bool {
    ROLLNO_REGEX.is_match(rollno)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    Ok(())
}

pub fn validate_rollno(rollno: &str) -> Result<(), String> {
    if rollno.trim().is_empty() {
        return Err("Roll number is required".to_string());
    }
    if !is_valid_rollno(rollno) {
        return Err("Roll number format: AM.SC.U4CSE23000".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if !is_valid_email(email) {
        return Err(format!("Email format: am.sc.u4cse23000{}", EMAIL_DOMAIN));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.trim().is_empty() {
        return Err("Phone number is required".to_string());
    }
    if !is_valid_phone(phone) {
        return Err("Phone number must be a valid 10-digit Indian number".to_string());
    }
    Ok(())
}

/// On update a blank password means "unchanged" and always passes.
pub fn validate_password(password: &str, mode: ValidationMode) -> Result<(), String> {
    if password.trim().is_empty() {
        return match mode {
            ValidationMode::Create => Err("Password is required".to_string()),
            ValidationMode::Update => Ok(()),
        };
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

pub fn validate_sig(sig: &str) -> Result<(), String> {
    if sig.trim().is_empty() {
        return Err("SIG is required".to_string());
    }
    if !SIG_OPTIONS.contains(&sig) {
        return Err(format!("SIG must be one of: {}", SIG_OPTIONS.join(", ")));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), String> {
    if role.trim().is_empty() {
        return Err("Role is required".to_string());
    }
    if !ROLE_OPTIONS.contains(&role) {
        return Err(format!("Role must be one of: {}", ROLE_OPTIONS.join(", ")));
    }
    Ok(())
}

pub fn validate_field(field: StudentField, value: &str, mode: ValidationMode) -> Result<(), String> {
    match field {
        StudentField::Name => validate_name(value),
        StudentField::Rollno => validate_rollno(value),
        StudentField::Email => validate_email(value),
        StudentField::Phone => validate_phone(value),
        StudentField::Password => validate_password(value, mode),
        StudentField::Sig => validate_sig(value),
        StudentField::Role => validate_role(value),
    }
}

/// Validate a complete form. `value_of` returns the current text of each field.
pub fn validate_form<'a, F>(value_of: F, mode: ValidationMode) -> FieldErrors
where
    F: Fn(StudentField) -> &'a str,
{
    let mut errors = FieldErrors::new();
    for field in StudentField::ALL {
        if let Err(e) = validate_field(field, value_of(field), mode) {
            errors.insert(field.as_str(), e);
        }
    }
    errors
}

/// Validate only the fields a request actually carried.
///
/// Used at the API boundary: a patch touching one field is judged on that
/// field alone, while absent fields are left to the store.
pub fn validate_supplied<'a, I>(supplied: I, mode: ValidationMode) -> FieldErrors
where
    I: IntoIterator<Item = (StudentField, &'a str)>,
{
    let mut errors = FieldErrors::new();
    for (field, value) in supplied {
        if let Err(e) = validate_field(field, value, mode) {
            errors.insert(field.as_str(), e);
        }
    }
    errors
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}
