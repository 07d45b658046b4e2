//! Attendance submitter: marks every visible student and sends one record
//! per student for the day.

use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::HashMap;

use crate::db::{AttendanceResponse, AttendanceStatus, CreateAttendanceRequest, StudentResponse};

use super::{AttendanceApi, RosterApi};

/// Group selector value that shows the whole roster
pub const ALL_GROUPS: &str = "All";

pub const LOAD_ERROR_MESSAGE: &str = "Could not fetch students. Make sure the API is running.";
pub const SUBMIT_ERROR_MESSAGE: &str = "Failed to submit attendance. Please try again.";

/// Result of sending one student's record
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub result: Result<AttendanceResponse, String>,
}

impl RecordOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-record outcomes of one batch, in roster order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub date: Option<NaiveDate>,
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(RecordOutcome::is_ok)
    }
}

#[derive(Debug, Default)]
pub struct AttendanceSubmitter {
    roster: Vec<StudentResponse>,
    statuses: HashMap<String, AttendanceStatus>,
    selected_group: Option<String>,
    loading: bool,
    submitting: bool,
    error: Option<String>,
    success: Option<String>,
}

impl AttendanceSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the roster and mark everyone present
    pub async fn load<A: RosterApi + ?Sized>(&mut self, api: &A) {
        self.loading = true;
        self.error = None;
        match api.list_students().await {
            Ok(students) => self.set_roster(students),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch roster for attendance");
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        self.loading = false;
    }

    /// Replace the roster. Every status goes back to present.
    pub fn set_roster(&mut self, students: Vec<StudentResponse>) {
        self.statuses = students
            .iter()
            .map(|s| (s.id.clone(), AttendanceStatus::Present))
            .collect();
        self.roster = students;
    }

    pub fn roster(&self) -> &[StudentResponse] {
        &self.roster
    }

    /// `All` followed by each SIG in order of first appearance
    pub fn groups(&self) -> Vec<String> {
        let mut groups = vec![ALL_GROUPS.to_string()];
        for student in &self.roster {
            if !groups.iter().skip(1).any(|g| g == &student.sig) {
                groups.push(student.sig.clone());
            }
        }
        groups
    }

    pub fn select_group(&mut self, group: &str) {
        self.selected_group = if group == ALL_GROUPS {
            None
        } else {
            Some(group.to_string())
        };
    }

    pub fn selected_group(&self) -> &str {
        self.selected_group.as_deref().unwrap_or(ALL_GROUPS)
    }

    pub fn filtered(&self) -> Vec<&StudentResponse> {
        match &self.selected_group {
            None => self.roster.iter().collect(),
            Some(group) => self.roster.iter().filter(|s| &s.sig == group).collect(),
        }
    }

    pub fn set_status(&mut self, student_id: &str, status: AttendanceStatus) {
        self.statuses.insert(student_id.to_string(), status);
    }

    pub fn status_of(&self, student_id: &str) -> AttendanceStatus {
        self.statuses.get(student_id).copied().unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.submitting && !self.filtered().is_empty()
    }

    /// Send one record per filtered student, all at once.
    ///
    /// Every request is awaited; a single failure makes the whole batch
    /// report failure, but records that went through are not rolled back.
    /// Returns `None` when submitting is not currently allowed.
    pub async fn submit_all<A: AttendanceApi + ?Sized>(
        &mut self,
        api: &A,
        today: NaiveDate,
    ) -> Option<BatchReport> {
        if !self.can_submit() {
            return None;
        }

        self.submitting = true;
        self.error = None;
        self.success = None;

        let requests: Vec<(String, AttendanceStatus, CreateAttendanceRequest)> = self
            .filtered()
            .into_iter()
            .map(|s| {
                let status = self.status_of(&s.id);
                (
                    s.id.clone(),
                    status,
                    CreateAttendanceRequest::new(s.id.clone(), today, status),
                )
            })
            .collect();

        let results = join_all(
            requests
                .iter()
                .map(|(_, _, req)| api.create_attendance(req)),
        )
        .await;

        let outcomes: Vec<RecordOutcome> = requests
            .into_iter()
            .zip(results)
            .map(|((student_id, status, _), result)| RecordOutcome {
                student_id,
                status,
                result: result.map_err(|e| e.display_message()),
            })
            .collect();

        let report = BatchReport {
            date: Some(today),
            outcomes,
        };

        if report.all_succeeded() {
            tracing::info!(date = %today, count = report.len(), "Attendance submitted");
            self.success = Some(format!(
                "Successfully submitted for {} students.",
                report.len()
            ));
        } else {
            let failed = report.failed().count();
            tracing::warn!(date = %today, failed, total = report.len(), "Attendance batch had failures");
            self.error = Some(SUBMIT_ERROR_MESSAGE.to_string());
        }

        self.submitting = false;
        Some(report)
    }
}
