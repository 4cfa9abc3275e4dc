use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use mongodb::{Client, Collection};

use crate::domain::{AchievementContent, AchievementDetail, Attachment};
use crate::store::error::StoreError;

/// Adapter owning the variable-shaped achievement content documents, keyed by
/// an opaque detail ref (the document id in hex form).
#[async_trait]
pub trait DetailStore: Send + Sync {
    /// Insert a new detail document and return its detail ref.
    async fn insert(&self, detail: AchievementDetail) -> Result<String, StoreError>;

    /// Fetch one document. Soft-deleted documents are excluded unless
    /// `include_deleted` is set.
    async fn find_by_ref(
        &self,
        detail_ref: &str,
        include_deleted: bool,
    ) -> Result<Option<AchievementDetail>, StoreError>;

    /// Wholesale replace of the content fields. Ownership, soft-delete state
    /// and `created_at` are preserved.
    async fn replace_content(
        &self,
        detail_ref: &str,
        content: AchievementContent,
    ) -> Result<(), StoreError>;

    /// Append one attachment to the document's list. Fails with NotFound if
    /// the document is missing or soft-deleted.
    async fn append_attachment(
        &self,
        detail_ref: &str,
        attachment: &Attachment,
    ) -> Result<(), StoreError>;

    /// Set the soft-delete marker.
    async fn mark_deleted(&self, detail_ref: &str) -> Result<(), StoreError>;

    /// Clear the soft-delete marker. Exists solely to undo a partially
    /// applied delete.
    async fn unmark_deleted(&self, detail_ref: &str) -> Result<(), StoreError>;

    /// Physically remove a document. Used only to compensate a failed
    /// create; normal deletion is always soft.
    async fn remove(&self, detail_ref: &str) -> Result<(), StoreError>;
}

/// MongoDB-backed detail store.
pub struct MongoDetailStore {
    collection: Collection<AchievementDetail>,
}

pub const ACHIEVEMENTS_COLLECTION: &str = "achievements";

impl MongoDetailStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection(ACHIEVEMENTS_COLLECTION);
        Self { collection }
    }

    fn object_id(detail_ref: &str) -> Result<ObjectId, StoreError> {
        ObjectId::parse_str(detail_ref)
            .map_err(|_| StoreError::InvalidInput(format!("invalid detail ref: {}", detail_ref)))
    }
}

#[async_trait]
impl DetailStore for MongoDetailStore {
    async fn insert(&self, detail: AchievementDetail) -> Result<String, StoreError> {
        let result = self.collection.insert_one(detail).await?;
        let oid = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Backend("inserted id is not an ObjectId".to_string()))?;
        Ok(oid.to_hex())
    }

    async fn find_by_ref(
        &self,
        detail_ref: &str,
        include_deleted: bool,
    ) -> Result<Option<AchievementDetail>, StoreError> {
        let oid = Self::object_id(detail_ref)?;
        let filter = if include_deleted {
            doc! { "_id": oid }
        } else {
            doc! { "_id": oid, "deleted": { "$ne": true } }
        };
        Ok(self.collection.find_one(filter).await?)
    }

    async fn replace_content(
        &self,
        detail_ref: &str,
        content: AchievementContent,
    ) -> Result<(), StoreError> {
        let oid = Self::object_id(detail_ref)?;

        // Read-modify-replace so a changed achievementType does not leave the
        // previous variant's fields behind, while ownership and soft-delete
        // state carry over untouched.
        let existing = self
            .collection
            .find_one(doc! { "_id": oid, "deleted": { "$ne": true } })
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("detail {} not found", detail_ref)))?;

        let replacement = AchievementDetail {
            id: existing.id,
            student_id: existing.student_id,
            title: content.title,
            description: content.description,
            kind: content.kind,
            tags: content.tags,
            points: content.points,
            attachments: content.attachments,
            custom_fields: content.custom_fields,
            deleted: existing.deleted,
            deleted_at: existing.deleted_at,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let result = self
            .collection
            .replace_one(doc! { "_id": oid }, replacement)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("detail {} not found", detail_ref)));
        }
        Ok(())
    }

    async fn append_attachment(
        &self,
        detail_ref: &str,
        attachment: &Attachment,
    ) -> Result<(), StoreError> {
        let oid = Self::object_id(detail_ref)?;
        let attachment_doc = bson::to_bson(attachment)
            .map_err(|e| StoreError::Backend(format!("attachment encode failed: {}", e)))?;
        let now = bson::to_bson(&Utc::now())
            .map_err(|e| StoreError::Backend(format!("timestamp encode failed: {}", e)))?;

        let result = self
            .collection
            .update_one(
                doc! { "_id": oid, "deleted": { "$ne": true } },
                doc! { "$push": { "attachments": attachment_doc }, "$set": { "updatedAt": now } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("detail {} not found", detail_ref)));
        }
        Ok(())
    }

    async fn mark_deleted(&self, detail_ref: &str) -> Result<(), StoreError> {
        let oid = Self::object_id(detail_ref)?;
        let now = bson::to_bson(&Utc::now())
            .map_err(|e| StoreError::Backend(format!("timestamp encode failed: {}", e)))?;

        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "deleted": true, "deletedAt": now.clone(), "updatedAt": now } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("detail {} not found", detail_ref)));
        }
        Ok(())
    }

    async fn unmark_deleted(&self, detail_ref: &str) -> Result<(), StoreError> {
        let oid = Self::object_id(detail_ref)?;
        let now = bson::to_bson(&Utc::now())
            .map_err(|e| StoreError::Backend(format!("timestamp encode failed: {}", e)))?;

        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$set": { "deleted": false, "updatedAt": now },
                    "$unset": { "deletedAt": "" },
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("detail {} not found", detail_ref)));
        }
        Ok(())
    }

    async fn remove(&self, detail_ref: &str) -> Result<(), StoreError> {
        let oid = Self::object_id(detail_ref)?;
        self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(())
    }
}
