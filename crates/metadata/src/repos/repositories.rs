//! Remote repository records.

use crate::error::MetadataResult;
use crate::models::{IntrospectionRecord, RepositoryRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for shared repository rows.
#[async_trait]
pub trait RepositoryRepo: Send + Sync {
    /// Get or create the repository for a URL.
    ///
    /// The URL is normalized first, so every spelling of the same URL maps to
    /// one row. Concurrent callers converge on the same row.
    async fn create_repository(&self, url: &str) -> MetadataResult<RepositoryRow>;

    /// Get a repository by uuid.
    async fn get_repository(&self, uuid: Uuid) -> MetadataResult<Option<RepositoryRow>>;

    /// Get a repository by URL (normalized before lookup).
    async fn get_repository_by_url(&self, url: &str) -> MetadataResult<Option<RepositoryRow>>;

    /// Record the outcome of an introspection pass.
    /// Returns `NotFound` if the repository does not exist.
    async fn record_introspection(
        &self,
        uuid: Uuid,
        record: &IntrospectionRecord,
    ) -> MetadataResult<()>;
}
