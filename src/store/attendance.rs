//! Attendance record persistence.
//!
//! Records only reference students by id. Nothing stops two records for the
//! same student and day; a resubmitted day simply adds rows.

use uuid::Uuid;

use crate::db::{
    parse_attendance_date, Attendance, AttendanceResponse, AttendanceStatus,
    AttendanceWithStudent, CreateAttendanceRequest, DbPool, StudentResponse,
    UpdateAttendanceRequest,
};
use crate::validation::{validate_uuid, FieldErrors};

use super::error::{StoreError, StoreResult};

/// Records joined with their student; the student side is NULL once deleted
const POPULATED_SELECT: &str = r#"
    SELECT a.id, a.student_id, a.date, a.status, a.created_at,
        s.id AS s_id, s.name AS s_name, s.rollno AS s_rollno, s.email AS s_email,
        s.phone AS s_phone, s.sig AS s_sig, s.role AS s_role,
        s.created_at AS s_created_at, s.updated_at AS s_updated_at
    FROM attendance a
    LEFT JOIN students s ON s.id = a.student_id
"#;

#[derive(sqlx::FromRow)]
struct PopulatedRow {
    #[sqlx(flatten)]
    record: Attendance,
    s_id: Option<String>,
    s_name: Option<String>,
    s_rollno: Option<String>,
    s_email: Option<String>,
    s_phone: Option<String>,
    s_sig: Option<String>,
    s_role: Option<String>,
    s_created_at: Option<String>,
    s_updated_at: Option<String>,
}

impl From<PopulatedRow> for AttendanceWithStudent {
    fn from(row: PopulatedRow) -> Self {
        let student = row.s_id.map(|id| StudentResponse {
            id,
            name: row.s_name.unwrap_or_default(),
            rollno: row.s_rollno.unwrap_or_default(),
            email: row.s_email.unwrap_or_default(),
            phone: row.s_phone.unwrap_or_default(),
            sig: row.s_sig.unwrap_or_default(),
            role: row.s_role.unwrap_or_default(),
            created_at: row.s_created_at.unwrap_or_default(),
            updated_at: row.s_updated_at.unwrap_or_default(),
        });
        AttendanceWithStudent {
            record: AttendanceResponse::from(row.record),
            student,
        }
    }
}

#[derive(Clone)]
pub struct AttendanceStore {
    db: DbPool,
}

/// Validated values of an attendance body; `None` means "not supplied".
struct AttendanceFields {
    student_id: Option<String>,
    date: Option<String>,
    status: Option<AttendanceStatus>,
}

fn check_fields(
    student_id: Option<&str>,
    date: Option<&str>,
    status: Option<&str>,
) -> StoreResult<AttendanceFields> {
    let mut errors = FieldErrors::new();

    if let Some(id) = student_id {
        if let Err(e) = validate_uuid(id, "studentId") {
            errors.insert("studentId", e);
        }
    }

    let date = match date.map(parse_attendance_date) {
        Some(Ok(d)) => Some(d.format("%Y-%m-%d").to_string()),
        Some(Err(e)) => {
            errors.insert("date", e);
            None
        }
        None => None,
    };

    let status = match status.map(|s| s.parse::<AttendanceStatus>()) {
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => {
            errors.insert("status", e);
            None
        }
        None => None,
    };

    if !errors.is_empty() {
        return Err(StoreError::Validation(errors));
    }

    Ok(AttendanceFields {
        student_id: student_id.map(str::to_string),
        date,
        status,
    })
}

impl AttendanceStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn find(&self, id: &str) -> StoreResult<Option<Attendance>> {
        let record = sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    pub async fn create(&self, req: CreateAttendanceRequest) -> StoreResult<AttendanceResponse> {
        let mut missing = FieldErrors::new();
        if req.student_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.insert("studentId", "studentId is required");
        }
        if req.date.is_none() {
            missing.insert("date", "Date is required");
        }
        if req.status.is_none() {
            missing.insert("status", "Status is required");
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        let fields = check_fields(
            req.student_id.as_deref(),
            req.date.as_deref(),
            req.status.as_deref(),
        )?;

        let record = Attendance {
            id: Uuid::new_v4().to_string(),
            student_id: fields.student_id.unwrap_or_default(),
            date: fields.date.unwrap_or_default(),
            status: fields.status.unwrap_or_default().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO attendance (id, student_id, date, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.student_id)
        .bind(&record.date)
        .bind(&record.status)
        .bind(&record.created_at)
        .execute(&self.db)
        .await?;

        tracing::debug!(
            id = %record.id,
            student_id = %record.student_id,
            date = %record.date,
            status = %record.status,
            "Recorded attendance"
        );

        Ok(AttendanceResponse::from(record))
    }

    /// Every record with its student embedded, newest day first
    pub async fn list_populated(&self) -> StoreResult<Vec<AttendanceWithStudent>> {
        let sql = format!(
            "{} ORDER BY a.date DESC, a.created_at ASC",
            POPULATED_SELECT
        );
        let rows = sqlx::query_as::<_, PopulatedRow>(&sql)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(AttendanceWithStudent::from).collect())
    }

    pub async fn get_populated(&self, id: &str) -> StoreResult<AttendanceWithStudent> {
        let sql = format!("{} WHERE a.id = ?", POPULATED_SELECT);
        let row = sqlx::query_as::<_, PopulatedRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound("Attendance record"))?;

        Ok(AttendanceWithStudent::from(row))
    }

    pub async fn list_for_student(&self, student_id: &str) -> StoreResult<Vec<AttendanceResponse>> {
        let records = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE student_id = ? ORDER BY date DESC, created_at ASC",
        )
        .bind(student_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records.into_iter().map(AttendanceResponse::from).collect())
    }

    pub async fn update(&self, id: &str, req: UpdateAttendanceRequest) -> StoreResult<AttendanceResponse> {
        let fields = check_fields(
            req.student_id.as_deref(),
            req.date.as_deref(),
            req.status.as_deref(),
        )?;

        let result = sqlx::query(
            r#"
            UPDATE attendance SET
                student_id = COALESCE(?, student_id),
                date = COALESCE(?, date),
                status = COALESCE(?, status)
            WHERE id = ?
            "#,
        )
        .bind(&fields.student_id)
        .bind(&fields.date)
        .bind(fields.status.map(|s| s.to_string()))
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Attendance record"));
        }

        let record = self
            .find(id)
            .await?
            .ok_or(StoreError::NotFound("Attendance record"))?;
        Ok(AttendanceResponse::from(record))
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Attendance record"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::store::StudentStore;
    use crate::db::CreateStudentRequest;

    async fn stores() -> (StudentStore, AttendanceStore, StudentResponse) {
        let pool = db::init_memory().await.unwrap();
        let students = StudentStore::new(pool.clone());
        let (_, student) = students
            .create(CreateStudentRequest {
                name: Some("A".to_string()),
                rollno: Some("AM.SC.U4CSE23029".to_string()),
                email: Some("am.sc.u4cse23029@am.students.amrita.edu".to_string()),
                sig: Some("WEB".to_string()),
                role: Some("CORE".to_string()),
                password: Some("secret1".to_string()),
                phone: Some("9876543210".to_string()),
            })
            .await
            .unwrap();
        (students, AttendanceStore::new(pool), student)
    }

    fn request(student_id: &str, date: &str, status: &str) -> CreateAttendanceRequest {
        CreateAttendanceRequest {
            student_id: Some(student_id.to_string()),
            date: Some(date.to_string()),
            status: Some(status.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_populate() {
        let (_, store, student) = stores().await;
        let created = store
            .create(request(&student.id, "2026-10-16T08:15:00Z", "late"))
            .await
            .unwrap();
        assert_eq!(created.date, "2026-10-16");
        assert_eq!(created.status, AttendanceStatus::Late);

        let all = store.list_populated().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].student.as_ref().map(|s| s.name.as_str()), Some("A"));

        let one = store.get_populated(&created.id).await.unwrap();
        assert_eq!(one.record, created);
        assert_eq!(one.student.map(|s| s.id), Some(student.id));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fields() {
        let (_, store, student) = stores().await;

        match store.create(request(&student.id, "yesterday", "excused")).await {
            Err(StoreError::Validation(errors)) => {
                assert!(errors.contains("date"));
                assert!(errors.contains("status"));
                assert!(!errors.contains("studentId"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        match store.create(CreateAttendanceRequest::default()).await {
            Err(StoreError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_day_duplicates_are_kept() {
        let (_, store, student) = stores().await;
        store.create(request(&student.id, "2026-10-16", "present")).await.unwrap();
        store.create(request(&student.id, "2026-10-16", "absent")).await.unwrap();

        let history = store.list_for_student(&student.id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_deleted_student_is_not_populated() {
        let (students, store, student) = stores().await;
        let created = store.create(request(&student.id, "2026-10-16", "present")).await.unwrap();
        students.delete(&student.id).await.unwrap();

        let one = store.get_populated(&created.id).await.unwrap();
        assert!(one.student.is_none());
        assert_eq!(one.record.student_id, student.id);
    }

    #[tokio::test]
    async fn test_list_populated_pairs_each_record_with_its_student() {
        let (students, store, first) = stores().await;
        let (_, second) = students
            .create(CreateStudentRequest {
                name: Some("B".to_string()),
                rollno: Some("AM.EN.U2ME21001".to_string()),
                email: Some("am.en.u2me21001@am.students.amrita.edu".to_string()),
                sig: Some("APP".to_string()),
                role: Some("MEMBER".to_string()),
                password: Some("hunter22".to_string()),
                phone: Some("7012345678".to_string()),
            })
            .await
            .unwrap();

        store.create(request(&first.id, "2026-10-15", "absent")).await.unwrap();
        store.create(request(&second.id, "2026-10-16", "present")).await.unwrap();
        store.create(request(&first.id, "2026-10-16", "late")).await.unwrap();
        students.delete(&second.id).await.unwrap();

        let all = store.list_populated().await.unwrap();
        let seen: Vec<(&str, Option<&str>)> = all
            .iter()
            .map(|r| (r.record.date.as_str(), r.student.as_ref().map(|s| s.name.as_str())))
            .collect();
        assert_eq!(
            seen,
            vec![("2026-10-16", None), ("2026-10-16", Some("A")), ("2026-10-15", Some("A"))]
        );
        assert_eq!(all[1].student.as_ref(), Some(&first));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_, store, student) = stores().await;
        let created = store.create(request(&student.id, "2026-10-16", "present")).await.unwrap();

        let updated = store
            .update(
                &created.id,
                UpdateAttendanceRequest {
                    status: Some("late".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AttendanceStatus::Late);
        assert_eq!(updated.date, created.date);

        assert!(matches!(
            store
                .update(
                    &created.id,
                    UpdateAttendanceRequest {
                        status: Some("gone".to_string()),
                        ..Default::default()
                    }
                )
                .await,
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.update("missing", UpdateAttendanceRequest::default()).await,
            Err(StoreError::NotFound(_))
        ));

        store.delete(&created.id).await.unwrap();
        assert!(matches!(store.delete(&created.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.get_populated(&created.id).await, Err(StoreError::NotFound(_))));
    }
}
