use thiserror::Error;

use crate::validation::FieldErrors;

/// Outcomes of store operations that are not a plain success.
///
/// Domain variants are meant to be shown to the user; `Database` and `Crypto`
/// are infrastructure faults whose details stay in the logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid ID format")]
    InvalidId,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("password hashing failed: {0}")]
    Crypto(argon2::password_hash::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // A unique index caught a duplicate the read-then-write check missed
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.message().contains("UNIQUE constraint failed") {
                return StoreError::Conflict(
                    "Student with this email or roll number already exists".to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}

impl From<argon2::password_hash::Error> for StoreError {
    fn from(err: argon2::password_hash::Error) -> Self {
        StoreError::Crypto(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
