//! Student models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::StudentField;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub rollno: String,
    pub email: String,
    pub phone: String,
    pub sig: String,
    pub role: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Student {
    /// Current value of an editable field. The password is never readable.
    pub fn field(&self, field: StudentField) -> Option<&str> {
        match field {
            StudentField::Name => Some(&self.name),
            StudentField::Rollno => Some(&self.rollno),
            StudentField::Email => Some(&self.email),
            StudentField::Phone => Some(&self.phone),
            StudentField::Sig => Some(&self.sig),
            StudentField::Role => Some(&self.role),
            StudentField::Password => None,
        }
    }
}

/// Outward view of a student, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: String,
    pub name: String,
    pub rollno: String,
    pub email: String,
    pub phone: String,
    pub sig: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            rollno: student.rollno,
            email: student.email,
            phone: student.phone,
            sig: student.sig,
            role: student.role,
            created_at: student.created_at,
            updated_at: student.updated_at,
        }
    }
}

impl StudentResponse {
    pub fn field(&self, field: StudentField) -> Option<&str> {
        match field {
            StudentField::Name => Some(&self.name),
            StudentField::Rollno => Some(&self.rollno),
            StudentField::Email => Some(&self.email),
            StudentField::Phone => Some(&self.phone),
            StudentField::Sig => Some(&self.sig),
            StudentField::Role => Some(&self.role),
            StudentField::Password => None,
        }
    }
}

/// Body of `POST /`. Every field is optional on the wire so that a missing
/// field can be reported by name instead of as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `PATCH /:id`. Absent fields are left untouched; an absent or
/// blank password keeps the stored credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

macro_rules! field_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn get(&self, field: StudentField) -> Option<&str> {
                match field {
                    StudentField::Name => self.name.as_deref(),
                    StudentField::Rollno => self.rollno.as_deref(),
                    StudentField::Email => self.email.as_deref(),
                    StudentField::Phone => self.phone.as_deref(),
                    StudentField::Password => self.password.as_deref(),
                    StudentField::Sig => self.sig.as_deref(),
                    StudentField::Role => self.role.as_deref(),
                }
            }

            pub fn set(&mut self, field: StudentField, value: String) {
                let slot = match field {
                    StudentField::Name => &mut self.name,
                    StudentField::Rollno => &mut self.rollno,
                    StudentField::Email => &mut self.email,
                    StudentField::Phone => &mut self.phone,
                    StudentField::Password => &mut self.password,
                    StudentField::Sig => &mut self.sig,
                    StudentField::Role => &mut self.role,
                };
                *slot = Some(value);
            }

            /// Fields present in the body, in form order
            pub fn supplied(&self) -> Vec<(StudentField, &str)> {
                StudentField::ALL
                    .into_iter()
                    .filter_map(|f| self.get(f).map(|v| (f, v)))
                    .collect()
            }
        }
    };
}

field_accessors!(CreateStudentRequest);
field_accessors!(UpdateStudentRequest);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Response of `POST /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentResponse {
    #[serde(flatten)]
    pub result: InsertResult,
    pub student: StudentResponse,
}

/// `{message, result}` envelope used by PATCH and DELETE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse<T> {
    pub message: String,
    pub result: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentLoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLoginResponse {
    pub message: String,
    pub student: StudentResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        Student {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            name: "A".to_string(),
            rollno: "AM.SC.U4CSE23029".to_string(),
            email: "am.sc.u4cse23029@am.students.amrita.edu".to_string(),
            phone: "9876543210".to_string(),
            sig: "WEB".to_string(),
            role: "CORE".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            created_at: "2026-10-16T09:00:00+00:00".to_string(),
            updated_at: "2026-10-16T09:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());

        let json = serde_json::to_value(StudentResponse::from(sample())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["rollno"], "AM.SC.U4CSE23029");
        assert_eq!(json["createdAt"], "2026-10-16T09:00:00+00:00");
    }

    #[test]
    fn test_update_request_supplied_fields() {
        let req: UpdateStudentRequest =
            serde_json::from_str(r#"{"rollno":"bad","phone":"9876543210"}"#).unwrap();
        let supplied = req.supplied();
        assert_eq!(supplied.len(), 2);
        assert_eq!(supplied[0], (StudentField::Rollno, "bad"));
        assert_eq!(supplied[1], (StudentField::Phone, "9876543210"));

    }

    #[test]
    fn test_create_response_shape() {
        let resp = CreateStudentResponse {
            result: InsertResult {
                acknowledged: true,
                inserted_id: "abc".to_string(),
            },
            student: StudentResponse::from(sample()),
        };
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["acknowledged"], true);
        assert_eq!(json["insertedId"], "abc");
        assert_eq!(json["student"]["name"], "A");
    }

    #[test]
    fn test_request_skips_absent_fields() {
        let mut req = UpdateStudentRequest::default();
        req.set(StudentField::Name, "B".to_string());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"name":"B"}"#);
    }
}
