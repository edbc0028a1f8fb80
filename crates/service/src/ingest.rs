//! Listing ingestion: decode a crawled listing, synchronize it and record the
//! introspection outcome on the repository.

use crate::error::{ServiceError, ServiceResult};
use crate::state::Services;
use reposync_core::{ContentKind, Environment, ErrorKind, Package, PackageGroup};
use reposync_metadata::models::IntrospectionRecord;
use reposync_metadata::{ContentRecord, ContentSynchronizer};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use uuid::Uuid;

pub const STATUS_VALID: &str = "Valid";
pub const STATUS_INVALID: &str = "Invalid";

/// Result of ingesting one listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SyncOutcome {
    pub kind: ContentKind,
    /// Items in the listing, duplicates included.
    pub listed: usize,
    /// Association rows created by this run.
    pub associations_inserted: u64,
}

impl Services {
    /// Synchronize a JSON-encoded listing of `kind` into a repository.
    ///
    /// On success the repository is marked valid, with its package count
    /// refreshed for package listings. A store failure during synchronization
    /// is recorded on the repository before it is returned; a listing that
    /// does not decode leaves the repository untouched.
    pub async fn sync_listing(
        &self,
        repository_uuid: Uuid,
        kind: ContentKind,
        listing: &[u8],
    ) -> ServiceResult<SyncOutcome> {
        let result = match kind {
            ContentKind::Package => {
                run_listing::<Package>(&self.packages, repository_uuid, listing).await
            }
            ContentKind::PackageGroup => {
                run_listing::<PackageGroup>(&self.package_groups, repository_uuid, listing).await
            }
            ContentKind::Environment => {
                run_listing::<Environment>(&self.environments, repository_uuid, listing).await
            }
        };

        match result {
            Ok((listed, associations_inserted)) => {
                let package_count = if kind == ContentKind::Package {
                    let count = self
                        .store()
                        .count_repository_content(kind, repository_uuid)
                        .await?;
                    Some(count as i64)
                } else {
                    None
                };
                self.record(repository_uuid, STATUS_VALID, None, package_count)
                    .await?;

                tracing::info!(
                    repository_uuid = %repository_uuid,
                    kind = %kind,
                    listed,
                    associations_inserted,
                    "Ingested listing"
                );
                Ok(SyncOutcome {
                    kind,
                    listed,
                    associations_inserted,
                })
            }
            Err(err @ ServiceError::Metadata(_)) if err.kind() != ErrorKind::NotFound => {
                if let Err(record_err) = self
                    .record(repository_uuid, STATUS_INVALID, Some(err.to_string()), None)
                    .await
                {
                    tracing::error!(
                        repository_uuid = %repository_uuid,
                        error = %record_err,
                        "Failed to record introspection failure"
                    );
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn record(
        &self,
        repository_uuid: Uuid,
        status: &str,
        error: Option<String>,
        package_count: Option<i64>,
    ) -> ServiceResult<()> {
        let record = IntrospectionRecord {
            status: status.to_string(),
            error,
            package_count,
            introspected_at: OffsetDateTime::now_utc(),
        };
        self.store()
            .record_introspection(repository_uuid, &record)
            .await?;
        Ok(())
    }
}

async fn run_listing<T>(
    synchronizer: &ContentSynchronizer<T>,
    repository_uuid: Uuid,
    listing: &[u8],
) -> ServiceResult<(usize, u64)>
where
    T: ContentRecord + DeserializeOwned,
{
    let items: Vec<T> = serde_json::from_slice(listing)?;
    let inserted = synchronizer
        .synchronize_repository(repository_uuid, &items)
        .await?;
    Ok((items.len(), inserted))
}
