//! Global content entities and their repository associations.
//!
//! Every method takes a [`ContentKind`] and resolves its tables through
//! [`ContentTable::for_kind`](crate::content_table::ContentTable::for_kind),
//! so one implementation serves packages, package groups and environments.

use crate::content_table::ContentRow;
use crate::error::MetadataResult;
use async_trait::async_trait;
use reposync_core::{ContentKind, NaturalKey};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Repository for content entities and associations.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Resolve natural keys to entity uuids. Keys without a row are absent
    /// from the result. Lookups are issued in batches bounded by
    /// `lookup_batch_size` bound parameters.
    async fn content_uuids(
        &self,
        kind: ContentKind,
        keys: &[NaturalKey],
        lookup_batch_size: usize,
    ) -> MetadataResult<HashMap<NaturalKey, Uuid>>;

    /// Insert entity rows in chunks of at most `batch_size` rows.
    /// Rows whose natural key already exists are skipped silently.
    /// Returns the number of rows actually inserted.
    async fn insert_content(
        &self,
        kind: ContentKind,
        rows: &[ContentRow],
        batch_size: usize,
    ) -> MetadataResult<u64>;

    /// Entity uuids currently associated with a repository.
    async fn associated_uuids(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
    ) -> MetadataResult<HashSet<Uuid>>;

    /// Delete the given associations of a repository. Returns rows deleted.
    async fn delete_associations(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
        content_uuids: &[Uuid],
        batch_size: usize,
    ) -> MetadataResult<u64>;

    /// Associate entities with a repository, skipping existing associations.
    /// Returns the number of association rows actually inserted.
    async fn insert_associations(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
        content_uuids: &[Uuid],
        batch_size: usize,
    ) -> MetadataResult<u64>;

    /// Entities with no association to any repository.
    async fn orphaned_uuids(&self, kind: ContentKind) -> MetadataResult<Vec<Uuid>>;

    /// Delete the given entities if they are still unassociated.
    /// Returns the number of rows deleted.
    async fn delete_orphans(
        &self,
        kind: ContentKind,
        content_uuids: &[Uuid],
        batch_size: usize,
    ) -> MetadataResult<u64>;

    /// Natural keys associated with a repository, sorted.
    async fn list_repository_content_keys(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
    ) -> MetadataResult<Vec<NaturalKey>>;

    /// Number of entities of a kind associated with a repository.
    async fn count_repository_content(
        &self,
        kind: ContentKind,
        repository_uuid: Uuid,
    ) -> MetadataResult<u64>;

    /// Total number of entity rows of a kind.
    async fn count_content(&self, kind: ContentKind) -> MetadataResult<u64>;
}
