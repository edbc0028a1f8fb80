//! Service wiring.

use crate::error::ServiceResult;
use crate::fetch::{HttpMetadataFetcher, MetadataFetcher};
use crate::validation::RepositoryValidator;
use reposync_core::ContentKind;
use reposync_core::config::AppConfig;
use reposync_metadata::{
    DomainAllocator, EnvironmentSynchronizer, MetadataStore, OrphanCollector,
    PackageGroupSynchronizer, PackageSynchronizer, UploadTracker,
};
use std::sync::Arc;

/// Every reposync operation, sharing one metadata store.
///
/// Cheap to clone; clones share the store and configuration.
#[derive(Clone)]
pub struct Services {
    config: Arc<AppConfig>,
    store: Arc<dyn MetadataStore>,
    pub packages: PackageSynchronizer,
    pub package_groups: PackageGroupSynchronizer,
    pub environments: EnvironmentSynchronizer,
    pub domains: DomainAllocator,
    pub uploads: UploadTracker,
    pub validator: RepositoryValidator,
}

impl Services {
    /// Build services over an open store, fetching metadata over HTTP.
    pub fn new(config: AppConfig, store: Arc<dyn MetadataStore>) -> ServiceResult<Self> {
        let fetcher = HttpMetadataFetcher::new(&config.validation)?;
        Self::with_fetcher(config, store, Arc::new(fetcher))
    }

    /// Build services with a custom metadata fetcher.
    pub fn with_fetcher(
        config: AppConfig,
        store: Arc<dyn MetadataStore>,
        fetcher: Arc<dyn MetadataFetcher>,
    ) -> ServiceResult<Self> {
        config.validate()?;

        Ok(Self {
            packages: PackageSynchronizer::new(store.clone(), config.sync.clone()),
            package_groups: PackageGroupSynchronizer::new(store.clone(), config.sync.clone()),
            environments: EnvironmentSynchronizer::new(store.clone(), config.sync.clone()),
            domains: DomainAllocator::new(store.clone(), config.domains.clone()),
            uploads: UploadTracker::new(store.clone()),
            validator: RepositoryValidator::new(store.clone(), fetcher, &config.validation),
            config: Arc::new(config),
            store,
        })
    }

    /// Open the configured metadata store and build services over it.
    pub async fn from_config(config: AppConfig) -> ServiceResult<Self> {
        let store = reposync_metadata::from_config(&config.metadata).await?;
        Self::new(config, store)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.store.clone()
    }

    /// The orphan collector for one content kind.
    pub fn collector(&self, kind: ContentKind) -> OrphanCollector {
        OrphanCollector::new(self.store.clone(), kind, self.config.sync.batch_size)
    }

    /// Run the collectors for `kinds` one after another.
    ///
    /// Stops at the first failure. Returns the rows deleted per kind.
    pub async fn collect_orphans(
        &self,
        kinds: &[ContentKind],
    ) -> ServiceResult<Vec<(ContentKind, u64)>> {
        let mut results = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let deleted = self.collector(*kind).collect_orphans().await?;
            results.push((*kind, deleted));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposync_metadata::SqliteStore;

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let store: Arc<dyn MetadataStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let mut config = AppConfig::for_testing();
        config.sync.batch_size = 0;
        let err = Services::new(config, store).err().unwrap();
        assert_eq!(err.code(), "core_error");
    }

    #[tokio::test]
    async fn test_collect_orphans_on_empty_store() {
        let store: Arc<dyn MetadataStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let services = Services::new(AppConfig::for_testing(), store).unwrap();
        let results = services.collect_orphans(&ContentKind::ALL).await.unwrap();
        assert_eq!(
            results,
            vec![
                (ContentKind::Package, 0),
                (ContentKind::PackageGroup, 0),
                (ContentKind::Environment, 0),
            ]
        );
    }
}
