//! Achievement coordinator: the status workflow and the dual-store
//! consistency protocol.
//!
//! Every operation authorizes through the guard before touching storage, and
//! the two-store writes are strictly sequential (detail first), because the
//! compensating actions assume that order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::{
    AchievementContent, AchievementDetail, AchievementReference, AchievementStatus, Actor,
    Attachment, NewReference, Page, Role, StatusChange,
};
use crate::guard;
use crate::services::error::AchievementError;
use crate::store::{AdvisorDirectory, DetailStore, ReferenceStore};

/// Listing parameters. Status filter and pagination only apply to the admin
/// scope; the other roles get their full (non-deleted) result set.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<AchievementStatus>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// One achievement in a listing: the reference row enriched with a few detail
/// fields. The detail fields are absent when the document lookup failed; a
/// missing document never fails the whole listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub id: Uuid,
    pub student_id: Uuid,
    pub status: AchievementStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub achievement_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementList {
    pub items: Vec<AchievementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Combined reference + document view for the detail endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    #[serde(flatten)]
    pub reference: AchievementReference,
    pub detail: AchievementDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub status: &'static str,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementHistory {
    pub id: Uuid,
    pub student_id: Uuid,
    pub current_status: AchievementStatus,
    pub events: Vec<HistoryEvent>,
}

/// Orchestrates creation, content updates, attachment appends and status
/// transitions across the reference and detail stores. The request surface
/// never touches the adapters directly.
#[derive(Clone)]
pub struct AchievementCoordinator {
    references: Arc<dyn ReferenceStore>,
    details: Arc<dyn DetailStore>,
    directory: Arc<dyn AdvisorDirectory>,
}

impl AchievementCoordinator {
    pub fn new(
        references: Arc<dyn ReferenceStore>,
        details: Arc<dyn DetailStore>,
        directory: Arc<dyn AdvisorDirectory>,
    ) -> Self {
        Self { references, details, directory }
    }

    /// Create a new achievement in `draft`.
    ///
    /// Two-step, not atomic: the detail document is inserted first, then the
    /// reference row pointing at it. If the reference insert fails, the fresh
    /// document is removed again as best-effort compensation; when even that
    /// fails the orphan is logged and left behind rather than retried.
    pub async fn create(
        &self,
        actor: &Actor,
        content: AchievementContent,
    ) -> Result<AchievementReference, AchievementError> {
        guard::ensure_role(actor, Role::Student)?;
        let student_id = guard::student_identity(actor)?;
        validate_content(&content)?;

        let detail = AchievementDetail::from_content(student_id, content);
        let detail_ref = self.details.insert(detail).await?;

        match self.references.create(NewReference { student_id, detail_ref: detail_ref.clone() }).await
        {
            Ok(reference) => Ok(reference),
            Err(err) => {
                if let Err(cleanup_err) = self.details.remove(&detail_ref).await {
                    error!(
                        detail_ref = %detail_ref,
                        error = %cleanup_err,
                        "consistency repair failed: orphaned detail document left behind"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Submit a draft for verification. Owner-only, draft-only. The final
    /// authority is the conditional status update, so of two concurrent
    /// submits exactly one wins.
    pub async fn submit(&self, id: Uuid, actor: &Actor) -> Result<(), AchievementError> {
        guard::ensure_role(actor, Role::Student)?;
        let reference = self.require_reference(id).await?;
        guard::ensure_owner(actor, &reference)?;
        require_transition(&reference, AchievementStatus::Submitted)?;

        let updated = self
            .references
            .update_status(id, AchievementStatus::Draft, StatusChange::to(AchievementStatus::Submitted))
            .await?;
        if !updated {
            return Err(self.lost_precondition(id, AchievementStatus::Draft).await);
        }
        Ok(())
    }

    /// Soft-delete a draft in both stores.
    ///
    /// Ordered: detail flag first, then the reference status. If the
    /// reference flip fails the detail flag is reverted so the two stores do
    /// not diverge; a failed revert is logged and the original error still
    /// propagates.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<(), AchievementError> {
        guard::ensure_role(actor, Role::Student)?;
        let reference = self.require_reference(id).await?;
        guard::ensure_owner(actor, &reference)?;
        require_transition(&reference, AchievementStatus::Deleted)?;

        self.details.mark_deleted(&reference.detail_ref).await?;

        let flipped = match self
            .references
            .update_status(id, AchievementStatus::Draft, StatusChange::to(AchievementStatus::Deleted))
            .await
        {
            Ok(flipped) => flipped,
            Err(err) => {
                self.revert_detail_delete(&reference.detail_ref).await;
                return Err(err.into());
            }
        };
        if !flipped {
            self.revert_detail_delete(&reference.detail_ref).await;
            return Err(self.lost_precondition(id, AchievementStatus::Draft).await);
        }
        Ok(())
    }

    /// Replace the achievement content wholesale. Owner-only, draft-only.
    /// Fields absent from the payload are reset; callers resend the complete
    /// detail object.
    pub async fn update_content(
        &self,
        id: Uuid,
        actor: &Actor,
        content: AchievementContent,
    ) -> Result<(), AchievementError> {
        guard::ensure_role(actor, Role::Student)?;
        let reference = self.require_reference(id).await?;
        guard::ensure_owner(actor, &reference)?;
        if reference.status != AchievementStatus::Draft {
            return Err(AchievementError::wrong_status(reference.status, AchievementStatus::Draft));
        }
        validate_content(&content)?;

        self.details.replace_content(&reference.detail_ref, content).await?;
        self.references.touch(id).await?;
        Ok(())
    }

    /// Ownership and status gate for attachment appends. The request surface
    /// runs this before the upload bytes are read or written anywhere, so a
    /// denied request leaves nothing on disk. Permitted in any status except
    /// `deleted`, since evidence gathering can lag submission.
    pub async fn authorize_attachment(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<AchievementReference, AchievementError> {
        guard::ensure_role(actor, Role::Student)?;
        let reference = self.require_reference(id).await?;
        guard::ensure_owner(actor, &reference)?;
        if reference.status == AchievementStatus::Deleted {
            return Err(AchievementError::InvalidStateTransition {
                current: reference.status,
                required: "any status except deleted",
            });
        }
        Ok(reference)
    }

    /// Append one evidence attachment. Re-runs the authorization gate so the
    /// append stays safe even when called without a prior pre-check.
    pub async fn add_attachment(
        &self,
        id: Uuid,
        actor: &Actor,
        attachment: Attachment,
    ) -> Result<Attachment, AchievementError> {
        let reference = self.authorize_attachment(id, actor).await?;
        self.details.append_attachment(&reference.detail_ref, &attachment).await?;
        Ok(attachment)
    }

    /// Verify a submitted achievement. Advisor-of-owner only.
    pub async fn verify(&self, id: Uuid, actor: &Actor) -> Result<(), AchievementError> {
        guard::ensure_role(actor, Role::Advisor)?;
        let reference = self.require_reference(id).await?;
        guard::ensure_advisor_of(self.directory.as_ref(), actor, reference.student_id).await?;
        require_transition(&reference, AchievementStatus::Verified)?;

        let updated = self
            .references
            .update_status(id, AchievementStatus::Submitted, StatusChange::verified_by(actor.user_id))
            .await?;
        if !updated {
            return Err(self.lost_precondition(id, AchievementStatus::Submitted).await);
        }
        Ok(())
    }

    /// Reject a submitted achievement with a mandatory note. `rejected` is
    /// terminal; no resubmission path exists.
    pub async fn reject(
        &self,
        id: Uuid,
        actor: &Actor,
        note: &str,
    ) -> Result<(), AchievementError> {
        guard::ensure_role(actor, Role::Advisor)?;
        let note = note.trim();
        if note.is_empty() {
            return Err(AchievementError::Validation(
                "rejection note must not be empty".to_string(),
            ));
        }

        let reference = self.require_reference(id).await?;
        guard::ensure_advisor_of(self.directory.as_ref(), actor, reference.student_id).await?;
        require_transition(&reference, AchievementStatus::Rejected)?;

        let updated = self
            .references
            .update_status(
                id,
                AchievementStatus::Submitted,
                StatusChange::rejected_by(actor.user_id, note.to_string()),
            )
            .await?;
        if !updated {
            return Err(self.lost_precondition(id, AchievementStatus::Submitted).await);
        }
        Ok(())
    }

    /// Role-scoped listing, newest first. One per-role strategy behind a
    /// single dispatch point.
    pub async fn list(
        &self,
        actor: &Actor,
        query: ListQuery,
    ) -> Result<AchievementList, AchievementError> {
        match actor.role {
            Role::Student => self.list_for_student(actor).await,
            Role::Advisor => self.list_for_advisor(actor).await,
            Role::Admin => self.list_for_admin(query).await,
        }
    }

    async fn list_for_student(&self, actor: &Actor) -> Result<AchievementList, AchievementError> {
        let student_id = guard::student_identity(actor)?;
        let references = self.references.find_by_student(student_id).await?;
        let items = self.enrich(references).await;
        Ok(AchievementList { items, meta: None })
    }

    async fn list_for_advisor(&self, actor: &Actor) -> Result<AchievementList, AchievementError> {
        let advisees = self
            .directory
            .advisee_student_ids(actor.user_id)
            .await
            .map_err(|e| AchievementError::Storage(e.to_string()))?;
        let references = self.references.find_by_advisees(&advisees).await?;
        let items = self.enrich(references).await;
        Ok(AchievementList { items, meta: None })
    }

    async fn list_for_admin(&self, query: ListQuery) -> Result<AchievementList, AchievementError> {
        let page = Page::clamped(query.page, query.page_size);
        let (references, total) = self.references.find_all(query.status, page).await?;
        let items = self.enrich(references).await;
        Ok(AchievementList {
            items,
            meta: Some(PageMeta {
                page: page.page,
                page_size: page.page_size,
                total_items: total,
                total_pages: page.total_pages(total),
            }),
        })
    }

    /// Combined reference + document view. Students see their own, advisors
    /// their advisees', admins everything.
    pub async fn detail(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<AchievementView, AchievementError> {
        let reference = self.require_reference(id).await?;
        self.authorize_read(actor, &reference).await?;

        let include_deleted = reference.status == AchievementStatus::Deleted;
        let detail = self
            .details
            .find_by_ref(&reference.detail_ref, include_deleted)
            .await?
            .ok_or(AchievementError::NotFound)?;

        Ok(AchievementView { reference, detail })
    }

    /// Status timeline derived from the reference timestamps. Same access
    /// rules as the detail view.
    pub async fn history(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<AchievementHistory, AchievementError> {
        let reference = self.require_reference(id).await?;
        self.authorize_read(actor, &reference).await?;

        let mut events = vec![HistoryEvent { status: "created", at: reference.created_at, note: None }];
        if let Some(at) = reference.submitted_at {
            events.push(HistoryEvent { status: "submitted", at, note: None });
        }
        match reference.status {
            AchievementStatus::Verified => {
                if let Some(at) = reference.verified_at {
                    events.push(HistoryEvent { status: "verified", at, note: None });
                }
            }
            AchievementStatus::Rejected => {
                if let Some(at) = reference.verified_at {
                    events.push(HistoryEvent {
                        status: "rejected",
                        at,
                        note: reference.rejection_note.clone(),
                    });
                }
            }
            AchievementStatus::Deleted => {
                events.push(HistoryEvent { status: "deleted", at: reference.updated_at, note: None });
            }
            _ => {}
        }

        Ok(AchievementHistory {
            id: reference.id,
            student_id: reference.student_id,
            current_status: reference.status,
            events,
        })
    }

    /// NotFound strictly before Forbidden: probing a missing id yields 404,
    /// probing an existing one without entitlement yields 403.
    async fn require_reference(
        &self,
        id: Uuid,
    ) -> Result<AchievementReference, AchievementError> {
        self.references
            .find_by_id(id)
            .await?
            .ok_or(AchievementError::NotFound)
    }

    async fn authorize_read(
        &self,
        actor: &Actor,
        reference: &AchievementReference,
    ) -> Result<(), AchievementError> {
        match actor.role {
            Role::Student => guard::ensure_owner(actor, reference),
            Role::Advisor => {
                guard::ensure_advisor_of(self.directory.as_ref(), actor, reference.student_id).await
            }
            Role::Admin => Ok(()),
        }
    }

    /// The losing side of a conditional update re-reads the row to report the
    /// actual current status instead of silently succeeding.
    async fn lost_precondition(&self, id: Uuid, required: AchievementStatus) -> AchievementError {
        match self.references.find_by_id(id).await {
            Ok(Some(current)) => AchievementError::wrong_status(current.status, required),
            Ok(None) => AchievementError::NotFound,
            Err(err) => err.into(),
        }
    }

    async fn revert_detail_delete(&self, detail_ref: &str) {
        if let Err(err) = self.details.unmark_deleted(detail_ref).await {
            error!(
                detail_ref = %detail_ref,
                error = %err,
                "consistency repair failed: detail left soft-deleted while reference kept its status"
            );
        }
    }

    async fn enrich(&self, references: Vec<AchievementReference>) -> Vec<AchievementSummary> {
        let mut items = Vec::with_capacity(references.len());
        for reference in references {
            let detail = match self.details.find_by_ref(&reference.detail_ref, false).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(
                        achievement_id = %reference.id,
                        detail_ref = %reference.detail_ref,
                        error = %err,
                        "detail lookup failed during listing; returning item without content fields"
                    );
                    None
                }
            };

            let (title, achievement_type, points, tags) = match detail {
                Some(detail) => (
                    Some(detail.title),
                    Some(detail.kind.type_name()),
                    Some(detail.points),
                    Some(detail.tags),
                ),
                None => (None, None, None, None),
            };

            items.push(AchievementSummary {
                id: reference.id,
                student_id: reference.student_id,
                status: reference.status,
                created_at: reference.created_at,
                submitted_at: reference.submitted_at,
                verified_at: reference.verified_at,
                verified_by: reference.verified_by,
                rejection_note: reference.rejection_note,
                title,
                achievement_type,
                points,
                tags,
            });
        }
        items
    }
}

/// Gate a lifecycle edge on the domain transition table. The error names
/// the status the requested edge departs from.
fn require_transition(
    reference: &AchievementReference,
    next: AchievementStatus,
) -> Result<(), AchievementError> {
    if reference.status.can_transition_to(next) {
        return Ok(());
    }
    let required = match next {
        AchievementStatus::Submitted | AchievementStatus::Deleted | AchievementStatus::Draft => {
            AchievementStatus::Draft
        }
        AchievementStatus::Verified | AchievementStatus::Rejected => AchievementStatus::Submitted,
    };
    Err(AchievementError::wrong_status(reference.status, required))
}

fn validate_content(content: &AchievementContent) -> Result<(), AchievementError> {
    if content.title.trim().is_empty() {
        return Err(AchievementError::Validation("title must not be empty".to_string()));
    }
    if content.points < 0 {
        return Err(AchievementError::Validation("points must not be negative".to_string()));
    }
    Ok(())
}
