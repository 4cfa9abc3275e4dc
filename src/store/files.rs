use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use uuid::Uuid;

use crate::store::error::StoreError;

/// Descriptor returned by file storage; the coordinator stores only this.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub file_url: String,
}

/// External file-storage capability: raw bytes in, retrievable URL out.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(
        &self,
        achievement_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StoreError>;
}

/// Stores uploads on the local filesystem under
/// `<root>/achievements/<achievement_id>/<unique>_<name>` and serves them
/// under a public URL prefix.
pub struct LocalFileStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self { root: root.into(), public_prefix: public_prefix.into() }
    }

    fn sanitize(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
            .collect()
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        achievement_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StoreError> {
        let safe_name = Self::sanitize(file_name);
        // Timestamp prefix keeps names unique without clobbering re-uploads.
        let unique_name = format!("{}_{}", Utc::now().timestamp_nanos_opt().unwrap_or(0), safe_name);

        let dir = self.root.join("achievements").join(achievement_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to prepare upload dir: {}", e)))?;

        let path = dir.join(&unique_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to write upload: {}", e)))?;

        let file_url = format!(
            "{}/achievements/{}/{}",
            self.public_prefix.trim_end_matches('/'),
            achievement_id,
            unique_name
        );

        Ok(StoredFile { file_name: file_name.to_string(), file_url })
    }
}
