//! Resumable upload repository.

use crate::error::MetadataResult;
use crate::models::UploadRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for resumable upload rows.
#[async_trait]
pub trait UploadRepo: Send + Sync {
    /// Insert a new upload. `chunk_list` is stored as given.
    async fn insert_upload(&self, upload: &UploadRow) -> MetadataResult<()>;

    /// Oldest upload matching the natural key.
    async fn find_upload(
        &self,
        org_id: &str,
        sha256: &str,
        chunk_size: i64,
    ) -> MetadataResult<Option<UploadRow>>;

    /// Append a chunk hash unless already present, in a single guarded update.
    /// Returns whether a row changed.
    async fn append_upload_chunk(
        &self,
        org_id: &str,
        upload_uuid: &str,
        chunk_sha256: &str,
    ) -> MetadataResult<bool>;

    /// Delete an upload. Returns whether a row was deleted.
    async fn delete_upload(&self, upload_uuid: &str) -> MetadataResult<bool>;

    /// Uploads created strictly before `cutoff`, oldest first.
    async fn list_uploads_created_before(
        &self,
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<UploadRow>>;
}
