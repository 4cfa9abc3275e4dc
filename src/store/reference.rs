use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::{AchievementReference, AchievementStatus, NewReference, Page, StatusChange};
use crate::store::error::StoreError;

/// Adapter owning the authoritative workflow-state rows.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Insert a new reference row with status `draft`. Fails if the student
    /// id is unset (nil).
    async fn create(&self, new: NewReference) -> Result<AchievementReference, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>, StoreError>;

    /// All references owned by one student, excluding `deleted`, newest first.
    async fn find_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AchievementReference>, StoreError>;

    /// Union of references for a set of students, excluding `deleted`,
    /// newest first.
    async fn find_by_advisees(
        &self,
        student_ids: &[Uuid],
    ) -> Result<Vec<AchievementReference>, StoreError>;

    /// Paginated listing over any status, newest first, with the total row
    /// count for the filter.
    async fn find_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<(Vec<AchievementReference>, i64), StoreError>;

    /// Conditional status transition: the row is updated only if its current
    /// status equals `expected`. Returns whether a row was affected; callers
    /// treat `false` as a lost precondition, never as success.
    ///
    /// Sets exactly the columns relevant to the target status (`submitted_at`
    /// on submit, `verified_at`/`verified_by` on verify and reject,
    /// `rejection_note` on reject) and always refreshes `updated_at`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        change: StatusChange,
    ) -> Result<bool, StoreError>;

    /// Refresh `updated_at` only, leaving status untouched.
    async fn touch(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Postgres-backed reference store. All SQL is runtime-checked; rows are
/// fetched into a raw row struct and converted into the domain type.
pub struct PgReferenceStore {
    pool: PgPool,
}

impl PgReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PgReferenceRow {
    id: Uuid,
    student_id: Uuid,
    detail_ref: String,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    verified_at: Option<DateTime<Utc>>,
    verified_by: Option<Uuid>,
    rejection_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PgReferenceRow> for AchievementReference {
    type Error = StoreError;

    fn try_from(row: PgReferenceRow) -> Result<Self, Self::Error> {
        let status: AchievementStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Backend(format!("corrupt status column: {}", e)))?;
        Ok(AchievementReference {
            id: row.id,
            student_id: row.student_id,
            detail_ref: row.detail_ref,
            status,
            submitted_at: row.submitted_at,
            verified_at: row.verified_at,
            verified_by: row.verified_by,
            rejection_note: row.rejection_note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const REFERENCE_COLUMNS: &str = "id, student_id, detail_ref, status, submitted_at, \
     verified_at, verified_by, rejection_note, created_at, updated_at";

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    async fn create(&self, new: NewReference) -> Result<AchievementReference, StoreError> {
        if new.student_id.is_nil() {
            return Err(StoreError::InvalidInput("student id must be set".to_string()));
        }
        if new.detail_ref.is_empty() {
            return Err(StoreError::InvalidInput("detail ref must be set".to_string()));
        }

        let sql = format!(
            "INSERT INTO achievement_references (student_id, detail_ref, status) \
             VALUES ($1, $2, 'draft') RETURNING {}",
            REFERENCE_COLUMNS
        );
        let row = sqlx::query_as::<_, PgReferenceRow>(&sql)
            .bind(new.student_id)
            .bind(&new.detail_ref)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>, StoreError> {
        let sql = format!("SELECT {} FROM achievement_references WHERE id = $1", REFERENCE_COLUMNS);
        let row = sqlx::query_as::<_, PgReferenceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AchievementReference>, StoreError> {
        let sql = format!(
            "SELECT {} FROM achievement_references \
             WHERE student_id = $1 AND status != 'deleted' \
             ORDER BY created_at DESC",
            REFERENCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PgReferenceRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_by_advisees(
        &self,
        student_ids: &[Uuid],
    ) -> Result<Vec<AchievementReference>, StoreError> {
        if student_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM achievement_references \
             WHERE student_id = ANY($1) AND status != 'deleted' \
             ORDER BY created_at DESC",
            REFERENCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PgReferenceRow>(&sql)
            .bind(student_ids)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<(Vec<AchievementReference>, i64), StoreError> {
        let (total, rows) = match status {
            Some(status) => {
                let total: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM achievement_references WHERE status = $1",
                )
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;
                let sql = format!(
                    "SELECT {} FROM achievement_references WHERE status = $1 \
                     ORDER BY created_at DESC OFFSET $2 LIMIT $3",
                    REFERENCE_COLUMNS
                );
                let rows = sqlx::query_as::<_, PgReferenceRow>(&sql)
                    .bind(status.as_str())
                    .bind(page.offset())
                    .bind(page.page_size)
                    .fetch_all(&self.pool)
                    .await?;
                (total.0, rows)
            }
            None => {
                let total: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM achievement_references")
                        .fetch_one(&self.pool)
                        .await?;
                let sql = format!(
                    "SELECT {} FROM achievement_references \
                     ORDER BY created_at DESC OFFSET $1 LIMIT $2",
                    REFERENCE_COLUMNS
                );
                let rows = sqlx::query_as::<_, PgReferenceRow>(&sql)
                    .bind(page.offset())
                    .bind(page.page_size)
                    .fetch_all(&self.pool)
                    .await?;
                (total.0, rows)
            }
        };

        let refs: Result<Vec<_>, _> = rows.into_iter().map(TryInto::try_into).collect();
        Ok((refs?, total))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        change: StatusChange,
    ) -> Result<bool, StoreError> {
        // One conditional UPDATE per target status: the WHERE clause is the
        // atomic precondition check, so concurrent callers cannot both win.
        let result = match change.status {
            AchievementStatus::Submitted => {
                sqlx::query(
                    "UPDATE achievement_references \
                     SET status = 'submitted', submitted_at = now(), updated_at = now() \
                     WHERE id = $1 AND status = $2",
                )
                .bind(id)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await?
            }
            AchievementStatus::Verified => {
                sqlx::query(
                    "UPDATE achievement_references \
                     SET status = 'verified', verified_at = now(), verified_by = $3, \
                         updated_at = now() \
                     WHERE id = $1 AND status = $2",
                )
                .bind(id)
                .bind(expected.as_str())
                .bind(change.verifier_id)
                .execute(&self.pool)
                .await?
            }
            AchievementStatus::Rejected => {
                sqlx::query(
                    "UPDATE achievement_references \
                     SET status = 'rejected', verified_at = now(), verified_by = $3, \
                         rejection_note = $4, updated_at = now() \
                     WHERE id = $1 AND status = $2",
                )
                .bind(id)
                .bind(expected.as_str())
                .bind(change.verifier_id)
                .bind(change.rejection_note.as_deref())
                .execute(&self.pool)
                .await?
            }
            AchievementStatus::Deleted => {
                sqlx::query(
                    "UPDATE achievement_references \
                     SET status = 'deleted', updated_at = now() \
                     WHERE id = $1 AND status = $2",
                )
                .bind(id)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await?
            }
            AchievementStatus::Draft => {
                return Err(StoreError::InvalidInput(
                    "no transition targets draft".to_string(),
                ));
            }
        };

        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE achievement_references SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
