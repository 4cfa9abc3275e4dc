//! In-memory store fakes with deterministic failure injection, for exercising
//! the coordinator's workflow and compensation logic without live databases.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    AchievementContent, AchievementDetail, AchievementReference, AchievementStatus, Attachment,
    NewReference, Page, StatusChange,
};
use crate::store::{AdvisorDirectory, DetailStore, ReferenceStore, StoreError};

/// Reference store fake. Conditional updates are applied under one lock, so
/// the at-most-one-winner guarantee of the real store holds here too.
#[derive(Default)]
pub struct InMemoryReferenceStore {
    rows: Mutex<Vec<AchievementReference>>,
    seq: AtomicI64,
    pub fail_next_create: AtomicBool,
    pub fail_next_update_status: AtomicBool,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }

    pub fn row(&self, id: Uuid) -> Option<AchievementReference> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn create(&self, new: NewReference) -> Result<AchievementReference, StoreError> {
        if Self::take(&self.fail_next_create) {
            return Err(StoreError::Backend("injected reference insert failure".to_string()));
        }
        if new.student_id.is_nil() {
            return Err(StoreError::InvalidInput("student id must be set".to_string()));
        }

        // Strictly increasing timestamps keep the newest-first ordering
        // deterministic even for back-to-back inserts.
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now() + Duration::milliseconds(seq);
        let reference = AchievementReference {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            detail_ref: new.detail_ref,
            status: AchievementStatus::Draft,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(reference.clone());
        Ok(reference)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AchievementReference>, StoreError> {
        Ok(self.row(id))
    }

    async fn find_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AchievementReference>, StoreError> {
        let mut refs: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id && r.status != AchievementStatus::Deleted)
            .cloned()
            .collect();
        refs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(refs)
    }

    async fn find_by_advisees(
        &self,
        student_ids: &[Uuid],
    ) -> Result<Vec<AchievementReference>, StoreError> {
        let mut refs: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                student_ids.contains(&r.student_id) && r.status != AchievementStatus::Deleted
            })
            .cloned()
            .collect();
        refs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(refs)
    }

    async fn find_all(
        &self,
        status: Option<AchievementStatus>,
        page: Page,
    ) -> Result<(Vec<AchievementReference>, i64), StoreError> {
        let mut refs: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        refs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = refs.len() as i64;
        let window: Vec<_> = refs
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        Ok((window, total))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AchievementStatus,
        change: StatusChange,
    ) -> Result<bool, StoreError> {
        if Self::take(&self.fail_next_update_status) {
            return Err(StoreError::Backend("injected status update failure".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = match rows.iter_mut().find(|r| r.id == id && r.status == expected) {
            Some(row) => row,
            None => return Ok(false),
        };

        let now = Utc::now();
        row.status = change.status;
        row.updated_at = now;
        match change.status {
            AchievementStatus::Submitted => row.submitted_at = Some(now),
            AchievementStatus::Verified => {
                row.verified_at = Some(now);
                row.verified_by = change.verifier_id;
            }
            AchievementStatus::Rejected => {
                row.verified_at = Some(now);
                row.verified_by = change.verifier_id;
                row.rejection_note = change.rejection_note;
            }
            _ => {}
        }
        Ok(true)
    }

    async fn touch(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Detail store fake keyed by synthetic refs.
#[derive(Default)]
pub struct InMemoryDetailStore {
    docs: Mutex<HashMap<String, AchievementDetail>>,
    seq: AtomicI64,
    pub fail_next_insert: AtomicBool,
    pub fail_next_mark_deleted: AtomicBool,
    pub fail_next_unmark_deleted: AtomicBool,
    pub fail_next_remove: AtomicBool,
}

impl InMemoryDetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }

    pub fn doc_count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_soft_deleted(&self, detail_ref: &str) -> Option<bool> {
        self.docs.lock().unwrap().get(detail_ref).map(|d| d.deleted)
    }

    /// Simulate external data loss for enrichment-degradation tests.
    pub fn drop_doc(&self, detail_ref: &str) {
        self.docs.lock().unwrap().remove(detail_ref);
    }
}

#[async_trait]
impl DetailStore for InMemoryDetailStore {
    async fn insert(&self, detail: AchievementDetail) -> Result<String, StoreError> {
        if Self::take(&self.fail_next_insert) {
            return Err(StoreError::Backend("injected detail insert failure".to_string()));
        }
        let detail_ref = format!("mem-{:06}", self.seq.fetch_add(1, Ordering::SeqCst));
        self.docs.lock().unwrap().insert(detail_ref.clone(), detail);
        Ok(detail_ref)
    }

    async fn find_by_ref(
        &self,
        detail_ref: &str,
        include_deleted: bool,
    ) -> Result<Option<AchievementDetail>, StoreError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .get(detail_ref)
            .filter(|d| include_deleted || !d.deleted)
            .cloned())
    }

    async fn replace_content(
        &self,
        detail_ref: &str,
        content: AchievementContent,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(detail_ref)
            .filter(|d| !d.deleted)
            .ok_or_else(|| StoreError::NotFound(format!("detail {} not found", detail_ref)))?;

        doc.title = content.title;
        doc.description = content.description;
        doc.kind = content.kind;
        doc.tags = content.tags;
        doc.points = content.points;
        doc.attachments = content.attachments;
        doc.custom_fields = content.custom_fields;
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn append_attachment(
        &self,
        detail_ref: &str,
        attachment: &Attachment,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(detail_ref)
            .filter(|d| !d.deleted)
            .ok_or_else(|| StoreError::NotFound(format!("detail {} not found", detail_ref)))?;
        doc.attachments.push(attachment.clone());
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_deleted(&self, detail_ref: &str) -> Result<(), StoreError> {
        if Self::take(&self.fail_next_mark_deleted) {
            return Err(StoreError::Backend("injected mark-deleted failure".to_string()));
        }
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(detail_ref)
            .ok_or_else(|| StoreError::NotFound(format!("detail {} not found", detail_ref)))?;
        doc.deleted = true;
        doc.deleted_at = Some(Utc::now());
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn unmark_deleted(&self, detail_ref: &str) -> Result<(), StoreError> {
        if Self::take(&self.fail_next_unmark_deleted) {
            return Err(StoreError::Backend("injected unmark-deleted failure".to_string()));
        }
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(detail_ref)
            .ok_or_else(|| StoreError::NotFound(format!("detail {} not found", detail_ref)))?;
        doc.deleted = false;
        doc.deleted_at = None;
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn remove(&self, detail_ref: &str) -> Result<(), StoreError> {
        if Self::take(&self.fail_next_remove) {
            return Err(StoreError::Backend("injected remove failure".to_string()));
        }
        self.docs.lock().unwrap().remove(detail_ref);
        Ok(())
    }
}

/// Advisor directory fake with explicit relation assignment.
#[derive(Default)]
pub struct StaticAdvisorDirectory {
    relations: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl StaticAdvisorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, advisor_user_id: Uuid, student_id: Uuid) {
        self.relations
            .lock()
            .unwrap()
            .entry(advisor_user_id)
            .or_default()
            .push(student_id);
    }
}

#[async_trait]
impl AdvisorDirectory for StaticAdvisorDirectory {
    async fn is_advisor_of(
        &self,
        advisor_user_id: Uuid,
        student_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self
            .relations
            .lock()
            .unwrap()
            .get(&advisor_user_id)
            .map_or(false, |students| students.contains(&student_id)))
    }

    async fn advisee_student_ids(
        &self,
        advisor_user_id: Uuid,
    ) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .relations
            .lock()
            .unwrap()
            .get(&advisor_user_id)
            .cloned()
            .unwrap_or_default())
    }
}
