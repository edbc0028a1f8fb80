//! Periodic orphan collection.

use crate::state::Services;
use reposync_core::ContentKind;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs the orphan collectors for `kinds` every `interval`.
#[derive(Clone)]
pub struct OrphanScheduler {
    services: Services,
    interval: Duration,
    kinds: Vec<ContentKind>,
}

impl OrphanScheduler {
    pub fn new(services: Services, interval: Duration, kinds: Vec<ContentKind>) -> Self {
        Self {
            services,
            interval,
            kinds,
        }
    }

    /// Build a scheduler from the orphan configuration, or `None` if
    /// automatic collection is disabled.
    pub fn from_config(services: &Services) -> Option<Self> {
        let config = &services.config().orphans;
        if !config.auto_schedule_enabled {
            return None;
        }
        Some(Self::new(
            services.clone(),
            config.interval(),
            config.kinds.clone(),
        ))
    }

    /// Run every configured collector once.
    ///
    /// A failing kind is logged and does not stop the others. Returns the
    /// total number of rows deleted.
    pub async fn run_once(&self) -> u64 {
        let mut total = 0;
        for kind in &self.kinds {
            tracing::info!(kind = %kind, "Triggering automatic orphan collection");
            match self.services.collector(*kind).collect_orphans().await {
                Ok(deleted) => total += deleted,
                Err(e) => {
                    tracing::error!(
                        kind = %kind,
                        error = %e,
                        "Automatic orphan collection failed, skipping this run"
                    );
                }
            }
        }
        total
    }

    /// Spawn the collection loop. The first run happens one interval after
    /// the call.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = self.interval.as_secs(),
                kinds = ?self.kinds,
                "Automatic orphan collection enabled"
            );

            loop {
                tokio::time::sleep(self.interval).await;
                let deleted = self.run_once().await;
                tracing::debug!(deleted, "Automatic orphan collection finished");
            }
        })
    }
}
