//! Resumable upload tracking.

use crate::error::{MetadataError, MetadataResult};
use crate::models::UploadRow;
use crate::store::MetadataStore;
use reposync_core::Sha256Digest;
use std::sync::Arc;
use time::OffsetDateTime;

/// An upload a client can resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingUpload {
    pub upload_uuid: String,
    pub completed_chunks: Vec<String>,
}

/// Records which chunks of a file upload have completed.
///
/// Uploads are keyed by `(org_id, sha256, chunk_size)`. Chunk hashes are
/// appended with a single guarded update, so retries and concurrent reports of
/// the same chunk record it once.
#[derive(Clone)]
pub struct UploadTracker {
    store: Arc<dyn MetadataStore>,
}

impl UploadTracker {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Start tracking an upload with no completed chunks.
    pub async fn store_file_upload(
        &self,
        org_id: &str,
        upload_uuid: &str,
        sha256: &str,
        chunk_size: i64,
    ) -> MetadataResult<()> {
        require_org(org_id)?;
        if upload_uuid.trim().is_empty() {
            return Err(MetadataError::InvalidInput(
                "upload_uuid cannot be blank".to_string(),
            ));
        }
        if chunk_size <= 0 {
            return Err(MetadataError::InvalidInput(format!(
                "chunk_size must be positive, got {chunk_size}"
            )));
        }
        let sha256 = Sha256Digest::from_hex(sha256)?.to_hex();

        let upload = UploadRow {
            upload_uuid: upload_uuid.to_string(),
            org_id: org_id.to_string(),
            sha256,
            chunk_size,
            chunk_list: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_upload(&upload).await?;

        tracing::debug!(org_id, upload_uuid, chunk_size, "Tracking file upload");
        Ok(())
    }

    /// Find a resumable upload for the same file and chunking.
    pub async fn get_existing_upload(
        &self,
        org_id: &str,
        sha256: &str,
        chunk_size: i64,
    ) -> MetadataResult<Option<ExistingUpload>> {
        require_org(org_id)?;
        let sha256 = Sha256Digest::from_hex(sha256)?.to_hex();
        let upload = self.store.find_upload(org_id, &sha256, chunk_size).await?;
        Ok(upload.map(|row| ExistingUpload {
            upload_uuid: row.upload_uuid,
            completed_chunks: row.chunk_list,
        }))
    }

    /// Record a completed chunk. Returns false if it was already recorded or
    /// the upload does not exist for this org.
    pub async fn store_chunk_upload(
        &self,
        org_id: &str,
        upload_uuid: &str,
        chunk_sha256: &str,
    ) -> MetadataResult<bool> {
        require_org(org_id)?;
        let chunk_sha256 = Sha256Digest::from_hex(chunk_sha256)?.to_hex();
        self.store
            .append_upload_chunk(org_id, upload_uuid, &chunk_sha256)
            .await
    }

    /// Stop tracking an upload. Returns whether it existed.
    pub async fn delete_upload(&self, upload_uuid: &str) -> MetadataResult<bool> {
        self.store.delete_upload(upload_uuid).await
    }

    /// Uploads started before `cutoff`, for the cleanup job.
    pub async fn list_uploads_created_before(
        &self,
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<UploadRow>> {
        self.store.list_uploads_created_before(cutoff).await
    }
}

fn require_org(org_id: &str) -> MetadataResult<()> {
    if org_id.trim().is_empty() {
        return Err(MetadataError::InvalidInput("org_id cannot be blank".to_string()));
    }
    Ok(())
}
