//! Roster controller: the client-side state machine behind the student list,
//! the add form and the edit form.

use crate::db::{CreateStudentRequest, StudentResponse, UpdateStudentRequest};
use crate::validation::{validate_form, FieldErrors, StudentField, ValidationMode};

use super::{ClientResult, RosterApi};

/// Key under which form-level failures are recorded
pub const SUBMIT_ERROR_KEY: &str = "submit";

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load students";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterState {
    Idle,
    SubmittingAdd,
    Editing(String),
    SubmittingEdit(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("Another submission is in progress")]
    Busy,
    #[error("No student is being edited")]
    NotEditing,
    #[error("Student not found: {0}")]
    UnknownStudent(String),
    #[error("Please fix the highlighted fields")]
    Invalid(FieldErrors),
    #[error("{0}")]
    Submit(String),
}

/// Text buffer behind the add and edit forms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    pub name: String,
    pub rollno: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub sig: String,
    pub role: String,
}

impl StudentForm {
    /// Edit form contents for an existing student; the password starts blank
    pub fn from_student(student: &StudentResponse) -> Self {
        Self {
            name: student.name.clone(),
            rollno: student.rollno.clone(),
            email: student.email.clone(),
            phone: student.phone.clone(),
            password: String::new(),
            sig: student.sig.clone(),
            role: student.role.clone(),
        }
    }

    pub fn get(&self, field: StudentField) -> &str {
        match field {
            StudentField::Name => &self.name,
            StudentField::Rollno => &self.rollno,
            StudentField::Email => &self.email,
            StudentField::Phone => &self.phone,
            StudentField::Password => &self.password,
            StudentField::Sig => &self.sig,
            StudentField::Role => &self.role,
        }
    }

    pub fn set(&mut self, field: StudentField, value: impl Into<String>) {
        let slot = match field {
            StudentField::Name => &mut self.name,
            StudentField::Rollno => &mut self.rollno,
            StudentField::Email => &mut self.email,
            StudentField::Phone => &mut self.phone,
            StudentField::Password => &mut self.password,
            StudentField::Sig => &mut self.sig,
            StudentField::Role => &mut self.role,
        };
        *slot = value.into();
    }

    pub fn validate(&self, mode: ValidationMode) -> FieldErrors {
        validate_form(|field| self.get(field), mode)
    }

    pub fn to_create_request(&self) -> CreateStudentRequest {
        let mut req = CreateStudentRequest::default();
        for field in StudentField::ALL {
            req.set(field, self.get(field).trim().to_string());
        }
        req
    }

    /// Patch carrying every field; a blank password is left out
    pub fn to_update_request(&self) -> UpdateStudentRequest {
        let mut req = UpdateStudentRequest::default();
        for field in StudentField::ALL {
            let value = self.get(field);
            if field == StudentField::Password && value.trim().is_empty() {
                continue;
            }
            req.set(field, value.trim().to_string());
        }
        req
    }
}

pub struct RosterController<A> {
    api: A,
    students: Vec<StudentResponse>,
    state: RosterState,
    add_form: StudentForm,
    add_errors: FieldErrors,
    edit_form: StudentForm,
    edit_errors: FieldErrors,
    load_error: Option<String>,
}

impl<A: RosterApi> RosterController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            students: Vec::new(),
            state: RosterState::Idle,
            add_form: StudentForm::default(),
            add_errors: FieldErrors::new(),
            edit_form: StudentForm::default(),
            edit_errors: FieldErrors::new(),
            load_error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn students(&self) -> &[StudentResponse] {
        &self.students
    }

    pub fn state(&self) -> &RosterState {
        &self.state
    }

    pub fn add_form(&self) -> &StudentForm {
        &self.add_form
    }

    pub fn add_errors(&self) -> &FieldErrors {
        &self.add_errors
    }

    pub fn edit_form(&self) -> &StudentForm {
        &self.edit_form
    }

    pub fn edit_errors(&self) -> &FieldErrors {
        &self.edit_errors
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Replace the list with the server's. On failure the current list stays.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        match self.api.list_students().await {
            Ok(students) => {
                self.students = students;
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch students");
                self.load_error = Some(LOAD_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn set_add_field(&mut self, field: StudentField, value: impl Into<String>) {
        self.add_form.set(field, value);
        self.add_errors.remove(field.as_str());
    }

    pub async fn submit_add(&mut self) -> Result<(), RosterError> {
        if self.state != RosterState::Idle {
            return Err(RosterError::Busy);
        }

        let errors = self.add_form.validate(ValidationMode::Create);
        if !errors.is_empty() {
            self.add_errors = errors.clone();
            return Err(RosterError::Invalid(errors));
        }

        self.state = RosterState::SubmittingAdd;
        let req = self.add_form.to_create_request();
        let result = self.api.create_student(&req).await;
        self.state = RosterState::Idle;

        match result {
            Ok(created) => {
                tracing::info!(id = %created.result.inserted_id, "Student added");
                self.add_form = StudentForm::default();
                self.add_errors.clear();
                let _ = self.refresh().await;
                Ok(())
            }
            Err(e) => {
                let message = e.display_message();
                self.add_errors.insert(SUBMIT_ERROR_KEY, message.clone());
                Err(RosterError::Submit(message))
            }
        }
    }

    pub fn start_edit(&mut self, id: &str) -> Result<(), RosterError> {
        match self.state {
            RosterState::Idle | RosterState::Editing(_) => {}
            _ => return Err(RosterError::Busy),
        }

        let student = self
            .students
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| RosterError::UnknownStudent(id.to_string()))?;

        self.edit_form = StudentForm::from_student(student);
        self.edit_errors.clear();
        self.state = RosterState::Editing(id.to_string());
        Ok(())
    }

    pub fn set_edit_field(&mut self, field: StudentField, value: impl Into<String>) {
        self.edit_form.set(field, value);
        self.edit_errors.remove(field.as_str());
    }

    pub async fn submit_edit(&mut self) -> Result<(), RosterError> {
        let id = match &self.state {
            RosterState::Editing(id) => id.clone(),
            RosterState::SubmittingAdd | RosterState::SubmittingEdit(_) => {
                return Err(RosterError::Busy)
            }
            RosterState::Idle => return Err(RosterError::NotEditing),
        };

        let errors = self.edit_form.validate(ValidationMode::Update);
        if !errors.is_empty() {
            self.edit_errors = errors.clone();
            return Err(RosterError::Invalid(errors));
        }

        self.state = RosterState::SubmittingEdit(id.clone());
        let req = self.edit_form.to_update_request();
        let result = self.api.update_student(&id, &req).await;

        match result {
            Ok(response) => {
                tracing::info!(id = %id, message = %response.message, "Student edited");
                self.state = RosterState::Idle;
                self.edit_form = StudentForm::default();
                self.edit_errors.clear();
                let _ = self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.state = RosterState::Editing(id);
                let message = e.display_message();
                self.edit_errors.insert(SUBMIT_ERROR_KEY, message.clone());
                Err(RosterError::Submit(message))
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        if let RosterState::Editing(_) = self.state {
            self.state = RosterState::Idle;
            self.edit_form = StudentForm::default();
            self.edit_errors.clear();
        }
    }

    /// Delete a student and refetch the list whatever the outcome.
    /// Form state is not touched.
    pub async fn delete(&mut self, id: &str) -> ClientResult<()> {
        let result = self.api.delete_student(id).await;
        if let Err(e) = &result {
            tracing::warn!(id = %id, error = %e, "Failed to delete student");
        }
        let _ = self.refresh().await;
        result.map(|_| ())
    }
}
