//! Attendance models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::student::StudentResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [Self::Present, Self::Absent, Self::Late];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        Self::Present
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            _ => Err(format!(
                "Status must be one of: {}",
                Self::ALL.map(|s| s.as_str()).join(", ")
            )),
        }
    }
}

impl From<String> for AttendanceStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// Parse an attendance date. Plain `YYYY-MM-DD` is stored as-is; a full
/// RFC 3339 timestamp is reduced to its UTC day.
pub fn parse_attendance_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Date is required".to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| "Date must be YYYY-MM-DD or an RFC 3339 timestamp".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub status: String,
    pub created_at: String,
}

impl Attendance {
    pub fn status_enum(&self) -> AttendanceStatus {
        AttendanceStatus::from(self.status.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub status: AttendanceStatus,
    pub created_at: String,
}

impl From<Attendance> for AttendanceResponse {
    fn from(record: Attendance) -> Self {
        let status = record.status_enum();
        Self {
            id: record.id,
            student_id: record.student_id,
            date: record.date,
            status,
            created_at: record.created_at,
        }
    }
}

/// Attendance record with the referenced student embedded. `student` is
/// `None` once the student has been deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceWithStudent {
    #[serde(flatten)]
    pub record: AttendanceResponse,
    pub student: Option<StudentResponse>,
}

/// Body of `POST /attendance`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceRequest {
    #[serde(default, alias = "student_id", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl CreateAttendanceRequest {
    pub fn new(student_id: impl Into<String>, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            student_id: Some(student_id.into()),
            date: Some(date.format("%Y-%m-%d").to_string()),
            status: Some(status.to_string()),
        }
    }
}

/// Body of `PUT /attendance/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceRequest {
    #[serde(default, alias = "student_id", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub message: String,
}
