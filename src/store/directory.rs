use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::error::StoreError;

/// Advisor-assignment bookkeeping, consumed by the coordinator as an external
/// capability. Advisors are keyed by their user (subject) id; the directory
/// resolves the lecturer record internally.
#[async_trait]
pub trait AdvisorDirectory: Send + Sync {
    async fn is_advisor_of(
        &self,
        advisor_user_id: Uuid,
        student_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn advisee_student_ids(
        &self,
        advisor_user_id: Uuid,
    ) -> Result<Vec<Uuid>, StoreError>;
}

/// Postgres-backed advisor directory over the `lecturers`/`students` tables.
pub struct PgAdvisorDirectory {
    pool: PgPool,
}

impl PgAdvisorDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdvisorDirectory for PgAdvisorDirectory {
    async fn is_advisor_of(
        &self,
        advisor_user_id: Uuid,
        student_id: Uuid,
    ) -> Result<bool, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM students s \
             JOIN lecturers l ON l.id = s.advisor_id \
             WHERE s.id = $1 AND l.user_id = $2",
        )
        .bind(student_id)
        .bind(advisor_user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn advisee_student_ids(
        &self,
        advisor_user_id: Uuid,
    ) -> Result<Vec<Uuid>, StoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT s.id FROM students s \
             JOIN lecturers l ON l.id = s.advisor_id \
             WHERE l.user_id = $1",
        )
        .bind(advisor_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
