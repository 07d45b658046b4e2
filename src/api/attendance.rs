//! Attendance endpoints: plain CRUD over attendance records.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    AttendanceResponse, AttendanceWithStudent, CreateAttendanceRequest, DeletedResponse,
    UpdateAttendanceRequest,
};
use crate::AppState;

use super::error::ApiError;

pub async fn create_attendance(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAttendanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiError> {
    let Json(req) = payload?;
    let record = state.attendance.create(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// All records with their students populated
pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AttendanceWithStudent>>, ApiError> {
    let records = state.attendance.list_populated().await?;
    Ok(Json(records))
}

pub async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AttendanceWithStudent>, ApiError> {
    let record = state.attendance.get_populated(&id).await?;
    Ok(Json(record))
}

/// Attendance history for one student
pub async fn student_attendance(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<Vec<AttendanceResponse>>, ApiError> {
    let records = state.attendance.list_for_student(&student_id).await?;
    Ok(Json(records))
}

pub async fn update_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAttendanceRequest>, JsonRejection>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let Json(req) = payload?;
    let record = state.attendance.update(&id, req).await?;
    Ok(Json(record))
}

pub async fn delete_attendance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.attendance.delete(&id).await?;
    Ok(Json(DeletedResponse {
        message: "Deleted".to_string(),
    }))
}
