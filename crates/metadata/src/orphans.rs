//! Orphan collection for global content rows.

use crate::error::{MetadataError, MetadataResult};
use crate::store::MetadataStore;
use reposync_core::ContentKind;
use std::sync::Arc;

/// Deletes content rows of one kind that no repository references.
///
/// Candidates are found with an anti-join, and the delete repeats the
/// anti-join predicate, so an association added in between keeps its row.
#[derive(Clone)]
pub struct OrphanCollector {
    store: Arc<dyn MetadataStore>,
    kind: ContentKind,
    batch_size: usize,
}

impl OrphanCollector {
    pub fn new(store: Arc<dyn MetadataStore>, kind: ContentKind, batch_size: usize) -> Self {
        Self {
            store,
            kind,
            batch_size: batch_size.max(1),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Delete every unreferenced row of this kind. Returns the number deleted.
    pub async fn collect_orphans(&self) -> MetadataResult<u64> {
        let candidates = self
            .store
            .orphaned_uuids(self.kind)
            .await
            .map_err(MetadataError::at_stage("find orphans"))?;

        if candidates.is_empty() {
            tracing::debug!(kind = %self.kind, "No orphaned content");
            return Ok(0);
        }

        let deleted = self
            .store
            .delete_orphans(self.kind, &candidates, self.batch_size)
            .await
            .map_err(MetadataError::at_stage("delete orphans"))?;

        tracing::info!(
            kind = %self.kind,
            candidates = candidates.len(),
            deleted,
            "Collected orphaned content"
        );
        Ok(deleted)
    }
}
