//! Client side of the roster: API traits, their HTTP implementation, and
//! the two stateful controllers that drive them.
//!
//! The controllers only ever talk to [`RosterApi`] / [`AttendanceApi`], so
//! they can run against a live server ([`HttpClient`]) or an in-memory fake.

mod attendance;
mod http;
mod roster;

pub use attendance::{AttendanceSubmitter, BatchReport, RecordOutcome, ALL_GROUPS};
pub use http::HttpClient;
pub use roster::{RosterController, RosterError, RosterState, StudentForm, SUBMIT_ERROR_KEY};

use async_trait::async_trait;

use crate::db::{
    AttendanceResponse, AttendanceWithStudent, CreateAttendanceRequest, CreateStudentRequest,
    CreateStudentResponse, DeleteResult, MessageResponse, StudentLoginResponse, StudentResponse,
    UpdateResult, UpdateStudentRequest,
};

/// Message shown for any failure that is not a server verdict
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server refused the request with a 4xx error envelope
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The server failed, or answered with something other than the envelope
    #[error("server error ({status})")]
    Server { status: u16 },

    /// The request never produced a usable answer
    #[error("network error: {0}")]
    Network(String),
}

impl ClientError {
    /// Text suitable for showing next to a form
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Rejected { message, .. } => message.clone(),
            ClientError::Server { .. } | ClientError::Network(_) => {
                NETWORK_ERROR_MESSAGE.to_string()
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } | ClientError::Server { status } => Some(*status),
            ClientError::Network(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Student endpoints as seen by a client
#[async_trait]
pub trait RosterApi: Send + Sync {
    async fn list_students(&self) -> ClientResult<Vec<StudentResponse>>;

    async fn create_student(&self, req: &CreateStudentRequest)
        -> ClientResult<CreateStudentResponse>;

    async fn update_student(
        &self,
        id: &str,
        req: &UpdateStudentRequest,
    ) -> ClientResult<MessageResponse<UpdateResult>>;

    async fn delete_student(&self, id: &str) -> ClientResult<MessageResponse<DeleteResult>>;

    async fn login(&self, email: &str, password: &str) -> ClientResult<StudentLoginResponse>;
}

/// Attendance endpoints as seen by a client
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn create_attendance(
        &self,
        req: &CreateAttendanceRequest,
    ) -> ClientResult<AttendanceResponse>;

    async fn list_attendance(&self) -> ClientResult<Vec<AttendanceWithStudent>>;

    async fn student_attendance(&self, student_id: &str) -> ClientResult<Vec<AttendanceResponse>>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory stand-in for a server, shared by the controller tests.

    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use crate::db::{AttendanceStatus, InsertResult};
    use crate::validation::StudentField;

    #[derive(Default)]
    pub struct FakeApi {
        pub students: Mutex<Vec<StudentResponse>>,
        pub created: Mutex<Vec<CreateStudentRequest>>,
        pub updates: Mutex<Vec<(String, UpdateStudentRequest)>>,
        pub deleted: Mutex<Vec<String>>,
        pub attendance: Mutex<Vec<CreateAttendanceRequest>>,
        pub list_calls: Mutex<usize>,
        /// Student ids whose attendance submissions are refused
        pub reject_attendance_for: Mutex<HashSet<String>>,
        pub fail_list: Mutex<bool>,
        pub fail_delete: Mutex<bool>,
        /// Next create/update is refused with this (status, message)
        pub reject_next_write: Mutex<Option<(u16, String)>>,
        pub network_down: Mutex<bool>,
    }

    pub fn student(id: &str, name: &str, sig: &str) -> StudentResponse {
        StudentResponse {
            id: id.to_string(),
            name: name.to_string(),
            rollno: "AM.SC.U4CSE23029".to_string(),
            email: "am.sc.u4cse23029@am.students.amrita.edu".to_string(),
            phone: "9876543210".to_string(),
            sig: sig.to_string(),
            role: "MEMBER".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    impl FakeApi {
        pub fn with_students(students: Vec<StudentResponse>) -> Self {
            let api = Self::default();
            *api.students.lock().unwrap() = students;
            api
        }

        fn check_network(&self) -> ClientResult<()> {
            if *self.network_down.lock().unwrap() {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            Ok(())
        }

        fn take_rejection(&self) -> ClientResult<()> {
            match self.reject_next_write.lock().unwrap().take() {
                Some((status, message)) => Err(ClientError::Rejected { status, message }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl RosterApi for FakeApi {
        async fn list_students(&self) -> ClientResult<Vec<StudentResponse>> {
            *self.list_calls.lock().unwrap() += 1;
            self.check_network()?;
            if *self.fail_list.lock().unwrap() {
                return Err(ClientError::Server { status: 500 });
            }
            Ok(self.students.lock().unwrap().clone())
        }

        async fn create_student(
            &self,
            req: &CreateStudentRequest,
        ) -> ClientResult<CreateStudentResponse> {
            self.check_network()?;
            self.take_rejection()?;
            self.created.lock().unwrap().push(req.clone());

            let id = format!("s{}", self.students.lock().unwrap().len() + 1);
            let value = |field: StudentField| req.get(field).unwrap_or_default().to_string();
            let created = StudentResponse {
                name: value(StudentField::Name),
                rollno: value(StudentField::Rollno),
                email: value(StudentField::Email),
                phone: value(StudentField::Phone),
                sig: value(StudentField::Sig),
                role: value(StudentField::Role),
                ..student(&id, "", "")
            };
            self.students.lock().unwrap().push(created.clone());
            Ok(CreateStudentResponse {
                result: InsertResult {
                    acknowledged: true,
                    inserted_id: id,
                },
                student: created,
            })
        }

        async fn update_student(
            &self,
            id: &str,
            req: &UpdateStudentRequest,
        ) -> ClientResult<MessageResponse<UpdateResult>> {
            self.check_network()?;
            self.take_rejection()?;
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), req.clone()));
            let mut students = self.students.lock().unwrap();
            let Some(existing) = students.iter_mut().find(|s| s.id == id) else {
                return Err(ClientError::Rejected {
                    status: 404,
                    message: "Student not found".to_string(),
                });
            };
            if let Some(name) = &req.name {
                existing.name = name.clone();
            }
            Ok(MessageResponse {
                message: "Student updated successfully".to_string(),
                result: UpdateResult {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: 1,
                },
            })
        }

        async fn delete_student(&self, id: &str) -> ClientResult<MessageResponse<DeleteResult>> {
            self.check_network()?;
            self.deleted.lock().unwrap().push(id.to_string());
            if *self.fail_delete.lock().unwrap() {
                return Err(ClientError::Rejected {
                    status: 404,
                    message: "Student not found".to_string(),
                });
            }
            self.students.lock().unwrap().retain(|s| s.id != id);
            Ok(MessageResponse {
                message: "Student deleted successfully".to_string(),
                result: DeleteResult {
                    acknowledged: true,
                    deleted_count: 1,
                },
            })
        }

        async fn login(&self, _email: &str, _password: &str) -> ClientResult<StudentLoginResponse> {
            Err(ClientError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string(),
            })
        }
    }

    #[async_trait]
    impl AttendanceApi for FakeApi {
        async fn create_attendance(
            &self,
            req: &CreateAttendanceRequest,
        ) -> ClientResult<AttendanceResponse> {
            self.check_network()?;
            self.attendance.lock().unwrap().push(req.clone());
            let student_id = req.student_id.clone().unwrap_or_default();
            if self
                .reject_attendance_for
                .lock()
                .unwrap()
                .contains(&student_id)
            {
                return Err(ClientError::Rejected {
                    status: 400,
                    message: "Validation failed".to_string(),
                });
            }
            Ok(AttendanceResponse {
                id: format!("a-{}", student_id),
                student_id,
                date: req.date.clone().unwrap_or_default(),
                status: req.status.clone().map(AttendanceStatus::from).unwrap_or_default(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
            })
        }

        async fn list_attendance(&self) -> ClientResult<Vec<AttendanceWithStudent>> {
            Ok(Vec::new())
        }

        async fn student_attendance(
            &self,
            _student_id: &str,
        ) -> ClientResult<Vec<AttendanceResponse>> {
            Ok(Vec::new())
        }
    }
}
