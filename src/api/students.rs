//! Student endpoints.
//!
//! Bodies are checked against the shared validation rules before they reach
//! the store; the store then enforces presence and uniqueness.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    CreateStudentRequest, CreateStudentResponse, DeleteResult, MessageResponse,
    StudentLoginRequest, StudentLoginResponse, StudentResponse, UpdateResult,
    UpdateStudentRequest,
};
use crate::store::StoreError;
use crate::validation::{validate_supplied, ValidationMode};
use crate::AppState;

use super::error::{ensure_valid, ApiError};

/// List all students
pub async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let students = state.students.list().await?;
    Ok(Json(students))
}

/// Get a student by ID
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = state.students.get(&id).await?;
    Ok(Json(student))
}

/// Create a new student
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateStudentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateStudentResponse>), ApiError> {
    let Json(req) = payload?;
    // Formats of what was sent; absent fields are reported by the store
    ensure_valid(validate_supplied(
        req.supplied()
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty()),
        ValidationMode::Create,
    ))?;

    let (result, student) = state.students.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateStudentResponse { result, student }),
    ))
}

/// Partially update a student
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStudentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse<UpdateResult>>, ApiError> {
    let Json(req) = payload?;
    ensure_valid(validate_supplied(req.supplied(), ValidationMode::Update))?;

    let outcome = state.students.update(&id, req).await?;
    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
        result: outcome.result(),
    }))
}

/// Delete a student
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse<DeleteResult>>, ApiError> {
    let result = state.students.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Student deleted successfully".to_string(),
        result,
    }))
}

/// Check a student's email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StudentLoginRequest>, JsonRejection>,
) -> Result<Json<StudentLoginResponse>, ApiError> {
    let Json(req) = payload?;
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let student = state.students.authenticate(&email, &password).await.map_err(|e| {
        if matches!(e, StoreError::InvalidCredentials) {
            tracing::warn!("Failed login attempt for {}", email);
        }
        ApiError::from(e)
    })?;

    Ok(Json(StudentLoginResponse {
        message: "Login successful".to_string(),
        student,
    }))
}
