//! Content synchronization engine.
//!
//! Brings a repository's associations for one content kind in line with a
//! complete crawled listing:
//!
//! 1. resolve the repository (absent: `NotFound`, nothing written)
//! 2. look up which natural keys already have a global row
//! 3. bulk-insert the unseen items, skipping rows another writer inserted first
//! 4. resolve the uuid of every listed key (the desired set)
//! 5. load the current association set
//! 6. delete associations no longer listed
//! 7. insert the missing associations
//!
//! Global rows are shared by every repository listing the same natural key and
//! are never deleted here; see [`OrphanCollector`](crate::orphans::OrphanCollector).

use crate::content_table::{ContentRecord, ContentRow};
use crate::error::{MetadataError, MetadataResult};
use crate::store::MetadataStore;
use reposync_core::config::SyncConfig;
use reposync_core::{ContentKind, Environment, NaturalKey, Package, PackageGroup};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Synchronizes package listings.
pub type PackageSynchronizer = ContentSynchronizer<Package>;
/// Synchronizes package group listings.
pub type PackageGroupSynchronizer = ContentSynchronizer<PackageGroup>;
/// Synchronizes environment group listings.
pub type EnvironmentSynchronizer = ContentSynchronizer<Environment>;

/// Association changes needed to move from `current` to `desired`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub to_delete: Vec<Uuid>,
    pub to_insert: Vec<Uuid>,
}

/// Compute `current \ desired` and `desired \ current`, both sorted.
pub fn reconcile(current: &HashSet<Uuid>, desired: &HashSet<Uuid>) -> Reconciliation {
    let mut to_delete: Vec<Uuid> = current.difference(desired).copied().collect();
    let mut to_insert: Vec<Uuid> = desired.difference(current).copied().collect();
    to_delete.sort();
    to_insert.sort();
    Reconciliation {
        to_delete,
        to_insert,
    }
}

/// Synchronizes one content kind for one repository at a time.
///
/// Calls for the same repository and kind must be serialized by the caller;
/// calls for different repositories may run concurrently.
pub struct ContentSynchronizer<T> {
    store: Arc<dyn MetadataStore>,
    config: SyncConfig,
    _item: PhantomData<fn(&T)>,
}

impl<T> Clone for ContentSynchronizer<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: ContentRecord> ContentSynchronizer<T> {
    pub fn new(store: Arc<dyn MetadataStore>, config: SyncConfig) -> Self {
        Self {
            store,
            config,
            _item: PhantomData,
        }
    }

    pub fn kind(&self) -> ContentKind {
        T::KIND
    }

    /// Make `items` the complete set of this kind associated with the repository.
    ///
    /// Duplicate natural keys in `items` are allowed; the first occurrence
    /// supplies the descriptive fields of a newly inserted row. Returns the
    /// number of association rows this call inserted.
    pub async fn synchronize_repository(
        &self,
        repository_uuid: Uuid,
        items: &[T],
    ) -> MetadataResult<u64> {
        let kind = T::KIND;
        let batch_size = self.config.batch_size.max(1);
        let lookup_batch_size = self.config.lookup_batch_size.max(1);

        self.store
            .get_repository(repository_uuid)
            .await
            .map_err(MetadataError::at_stage("resolve repository"))?
            .ok_or_else(|| MetadataError::NotFound(format!("repository {repository_uuid}")))?;

        let rows = unique_rows(items)?;
        let keys: Vec<NaturalKey> = rows.iter().map(|row| row.key.clone()).collect();

        let existing = self
            .store
            .content_uuids(kind, &keys, lookup_batch_size)
            .await
            .map_err(MetadataError::at_stage("look up existing content"))?;

        let unseen: Vec<ContentRow> = rows
            .into_iter()
            .filter(|row| !existing.contains_key(&row.key))
            .collect();
        let created = if unseen.is_empty() {
            0
        } else {
            self.store
                .insert_content(kind, &unseen, batch_size)
                .await
                .map_err(MetadataError::at_stage("insert content"))?
        };

        let desired: HashSet<Uuid> = if unseen.is_empty() {
            existing.into_values().collect()
        } else {
            self.store
                .content_uuids(kind, &keys, lookup_batch_size)
                .await
                .map_err(MetadataError::at_stage("resolve content uuids"))?
                .into_values()
                .collect()
        };

        let current = self
            .store
            .associated_uuids(kind, repository_uuid)
            .await
            .map_err(MetadataError::at_stage("load associations"))?;

        let plan = reconcile(&current, &desired);

        let removed = if plan.to_delete.is_empty() {
            0
        } else {
            self.store
                .delete_associations(kind, repository_uuid, &plan.to_delete, batch_size)
                .await
                .map_err(MetadataError::at_stage("delete stale associations"))?
        };

        let associated = if plan.to_insert.is_empty() {
            0
        } else {
            self.store
                .insert_associations(kind, repository_uuid, &plan.to_insert, batch_size)
                .await
                .map_err(MetadataError::at_stage("insert associations"))?
        };

        tracing::info!(
            repository_uuid = %repository_uuid,
            kind = %kind,
            listed = keys.len(),
            created,
            removed,
            associated,
            "Synchronized repository content"
        );

        Ok(associated)
    }
}

/// Convert items to rows, keeping the first occurrence of each natural key.
fn unique_rows<T: ContentRecord>(items: &[T]) -> MetadataResult<Vec<ContentRow>> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let key = item.natural_key();
        if seen.contains(&key) {
            continue;
        }
        let row = item.to_row()?;
        seen.insert(key);
        rows.push(row);
    }
    Ok(rows)
}
