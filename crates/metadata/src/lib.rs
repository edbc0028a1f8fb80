//! Relational content index for reposync.
//!
//! This crate owns everything that touches the database:
//! - Shared repositories and per-tenant repository configurations
//! - Globally deduplicated packages, package groups and environments
//! - The per-kind content synchronization engine and orphan collection
//! - Tenant storage-domain allocation
//! - Resumable upload tracking

pub mod content_table;
pub mod domain_allocator;
pub mod error;
pub mod models;
pub mod orphans;
pub mod postgres;
pub mod repos;
pub mod store;
pub mod sync;
pub mod upload_tracker;

pub use content_table::{ContentRecord, ContentTable};
pub use domain_allocator::DomainAllocator;
pub use error::{MetadataError, MetadataResult};
pub use orphans::OrphanCollector;
pub use postgres::PostgresStore;
pub use store::{MetadataStore, SqliteStore};
pub use sync::{
    ContentSynchronizer, EnvironmentSynchronizer, PackageGroupSynchronizer, PackageSynchronizer,
    Reconciliation, reconcile,
};
pub use upload_tracker::{ExistingUpload, UploadTracker};

use reposync_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *query_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        MetadataConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(MetadataError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
