//! Tenant repository configurations.

use crate::error::MetadataResult;
use crate::models::{NewRepositoryConfig, RepositoryConfigRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for per-tenant repository configurations.
#[async_trait]
pub trait RepositoryConfigRepo: Send + Sync {
    /// Create a configuration, creating its shared repository row if needed.
    ///
    /// Returns `AlreadyExists` if the org already has a configuration with the
    /// same name or the same URL.
    async fn create_repository_config(
        &self,
        config: &NewRepositoryConfig,
    ) -> MetadataResult<RepositoryConfigRow>;

    /// Get a configuration by uuid.
    async fn get_repository_config(&self, uuid: Uuid)
    -> MetadataResult<Option<RepositoryConfigRow>>;

    /// List an org's configurations ordered by name.
    async fn list_repository_configs(&self, org_id: &str)
    -> MetadataResult<Vec<RepositoryConfigRow>>;

    /// Whether the org has a configuration named `name`, ignoring `excluded` uuids.
    async fn repository_name_in_use(
        &self,
        org_id: &str,
        name: &str,
        excluded: &[Uuid],
    ) -> MetadataResult<bool>;

    /// Whether the org has a configuration for `url`, ignoring `excluded` uuids.
    /// `url` must already be normalized.
    async fn repository_url_in_use(
        &self,
        org_id: &str,
        url: &str,
        excluded: &[Uuid],
    ) -> MetadataResult<bool>;

    /// Orgs holding a configuration for `url` (already normalized).
    async fn org_ids_for_url(&self, url: &str) -> MetadataResult<Vec<String>>;
}
