use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::AchievementStatus;

/// Relational workflow-state record for one achievement.
///
/// This row is the single source of truth for ownership and lifecycle state.
/// `detail_ref` holds the document-store id of the matching detail record as a
/// plain value; there is no database-enforced foreign key between the stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementReference {
    pub id: Uuid,
    pub student_id: Uuid,
    pub detail_ref: String,
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a new reference row (status starts at `draft`).
#[derive(Debug, Clone)]
pub struct NewReference {
    pub student_id: Uuid,
    pub detail_ref: String,
}

/// Field changes applied by a status transition. The store sets exactly the
/// columns relevant to the target status and always refreshes `updated_at`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: AchievementStatus,
    pub verifier_id: Option<Uuid>,
    pub rejection_note: Option<String>,
}

impl StatusChange {
    pub fn to(status: AchievementStatus) -> Self {
        Self { status, verifier_id: None, rejection_note: None }
    }

    pub fn verified_by(verifier_id: Uuid) -> Self {
        Self {
            status: AchievementStatus::Verified,
            verifier_id: Some(verifier_id),
            rejection_note: None,
        }
    }

    pub fn rejected_by(verifier_id: Uuid, note: String) -> Self {
        Self {
            status: AchievementStatus::Rejected,
            verifier_id: Some(verifier_id),
            rejection_note: Some(note),
        }
    }
}
