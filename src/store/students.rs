//! Student persistence.
//!
//! Each call is independent: the store keeps no state besides the pool, and
//! callers are expected to re-read the list after a mutation.

use uuid::Uuid;

use crate::crypto::{hash_password, verify_password};
use crate::db::{
    CreateStudentRequest, DbPool, DeleteResult, InsertResult, Student, StudentResponse,
    UpdateResult, UpdateStudentRequest,
};
use crate::validation::{validate_uuid, StudentField};

use super::error::{StoreError, StoreResult};

/// Create requires every field, in this order.
const REQUIRED_FIELDS: [StudentField; 7] = [
    StudentField::Name,
    StudentField::Rollno,
    StudentField::Email,
    StudentField::Sig,
    StudentField::Role,
    StudentField::Password,
    StudentField::Phone,
];

const DUPLICATE_MESSAGE: &str = "Student with this email or roll number already exists";
const DUPLICATE_OTHER_MESSAGE: &str =
    "Another student with this email or roll number already exists";

/// A unique-index hit while patching means another record owns the value
fn conflict_with_other(err: sqlx::Error) -> StoreError {
    match StoreError::from(err) {
        StoreError::Conflict(_) => StoreError::Conflict(DUPLICATE_OTHER_MESSAGE.to_string()),
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(UpdateResult),
    NoChanges(UpdateResult),
}

impl UpdateOutcome {
    pub fn result(&self) -> UpdateResult {
        match self {
            UpdateOutcome::Updated(r) | UpdateOutcome::NoChanges(r) => *r,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UpdateOutcome::Updated(_) => "Student updated successfully",
            UpdateOutcome::NoChanges(_) => "No changes made",
        }
    }
}

#[derive(Clone)]
pub struct StudentStore {
    db: DbPool,
}

fn check_id(id: &str) -> StoreResult<()> {
    validate_uuid(id, "id").map_err(|_| StoreError::InvalidId)
}

impl StudentStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn find(&self, id: &str) -> StoreResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(student)
    }

    /// All students, oldest first
    pub async fn list(&self) -> StoreResult<Vec<StudentResponse>> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(students.into_iter().map(StudentResponse::from).collect())
    }

    pub async fn get(&self, id: &str) -> StoreResult<StudentResponse> {
        check_id(id)?;
        self.find(id)
            .await?
            .map(StudentResponse::from)
            .ok_or(StoreError::NotFound("Student"))
    }

    pub async fn create(
        &self,
        req: CreateStudentRequest,
    ) -> StoreResult<(InsertResult, StudentResponse)> {
        for field in REQUIRED_FIELDS {
            let present = req.get(field).map(|v| !v.trim().is_empty()).unwrap_or(false);
            if !present {
                return Err(StoreError::MissingField(field.as_str()));
            }
        }
        let take = |v: Option<String>| v.unwrap_or_default();

        let rollno = take(req.rollno);
        let email = take(req.email);

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM students WHERE email = ? OR rollno = ? LIMIT 1")
                .bind(&email)
                .bind(&rollno)
                .fetch_optional(&self.db)
                .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(DUPLICATE_MESSAGE.to_string()));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: take(req.name),
            rollno,
            email,
            phone: take(req.phone),
            sig: take(req.sig),
            role: take(req.role),
            password_hash: hash_password(&take(req.password))?,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO students (id, name, rollno, email, phone, sig, role, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.rollno)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(&student.sig)
        .bind(&student.role)
        .bind(&student.password_hash)
        .bind(&student.created_at)
        .bind(&student.updated_at)
        .execute(&self.db)
        .await?;

        tracing::info!(id = %student.id, rollno = %student.rollno, "Created student");

        let result = InsertResult {
            acknowledged: true,
            inserted_id: student.id.clone(),
        };
        Ok((result, StudentResponse::from(student)))
    }

    /// Apply a patch. Only fields that differ from the stored record count as
    /// changes; a patch with no effective change writes nothing and leaves
    /// `updated_at` alone.
    pub async fn update(&self, id: &str, req: UpdateStudentRequest) -> StoreResult<UpdateOutcome> {
        check_id(id)?;
        let existing = self.find(id).await?.ok_or(StoreError::NotFound("Student"))?;

        if req.email.is_some() || req.rollno.is_some() {
            let duplicate: Option<(String,)> = sqlx::query_as(
                "SELECT id FROM students WHERE id <> ? AND (email = ? OR rollno = ?) LIMIT 1",
            )
            .bind(id)
            .bind(&req.email)
            .bind(&req.rollno)
            .fetch_optional(&self.db)
            .await?;
            if duplicate.is_some() {
                return Err(StoreError::Conflict(DUPLICATE_OTHER_MESSAGE.to_string()));
            }
        }

        let changed = |field: StudentField| -> Option<String> {
            let new = req.get(field)?;
            (existing.field(field) != Some(new)).then(|| new.to_string())
        };
        let name = changed(StudentField::Name);
        let rollno = changed(StudentField::Rollno);
        let email = changed(StudentField::Email);
        let phone = changed(StudentField::Phone);
        let sig = changed(StudentField::Sig);
        let role = changed(StudentField::Role);
        let password_hash = match req.password.as_deref() {
            Some(p) if !p.trim().is_empty() => Some(hash_password(p)?),
            _ => None,
        };

        let no_changes = [&name, &rollno, &email, &phone, &sig, &role, &password_hash]
            .iter()
            .all(|v| v.is_none());
        if no_changes {
            return Ok(UpdateOutcome::NoChanges(UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: 0,
            }));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE students SET
                name = COALESCE(?, name),
                rollno = COALESCE(?, rollno),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                sig = COALESCE(?, sig),
                role = COALESCE(?, role),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&rollno)
        .bind(&email)
        .bind(&phone)
        .bind(&sig)
        .bind(&role)
        .bind(&password_hash)
        .bind(&now)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(conflict_with_other)?;

        // Deleted between the lookup and the write
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Student"));
        }

        tracing::info!(
            id = %id,
            password_changed = password_hash.is_some(),
            "Updated student"
        );

        Ok(UpdateOutcome::Updated(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: 1,
        }))
    }

    pub async fn delete(&self, id: &str) -> StoreResult<DeleteResult> {
        check_id(id)?;
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Student"));
        }

        tracing::info!(id = %id, "Deleted student");
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    /// Check a login. Unknown email and wrong password are indistinguishable.
    pub async fn authenticate(&self, email: &str, password: &str) -> StoreResult<StudentResponse> {
        if email.trim().is_empty() {
            return Err(StoreError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(StoreError::MissingField("password"));
        }

        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::InvalidCredentials)?;

        if !verify_password(password, &student.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        Ok(StudentResponse::from(student))
    }
}
