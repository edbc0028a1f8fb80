//! Tenant storage-domain allocation.
//!
//! Every org gets exactly one short domain name, assigned on first use. Many
//! requests for a new org can race; each writes a candidate with a
//! conflict-tolerant insert and then re-reads the row that won.

use crate::error::{MetadataError, MetadataResult};
use crate::models::DomainRow;
use crate::store::MetadataStore;
use reposync_core::config::DomainConfig;
use reposync_core::generate_domain_name;
use std::sync::Arc;

#[derive(Clone)]
pub struct DomainAllocator {
    store: Arc<dyn MetadataStore>,
    config: DomainConfig,
}

impl DomainAllocator {
    pub fn new(store: Arc<dyn MetadataStore>, config: DomainConfig) -> Self {
        Self { store, config }
    }

    /// The org's domain name, if one has been assigned.
    pub async fn fetch(&self, org_id: &str) -> MetadataResult<Option<String>> {
        let mut names = self.store.domain_names_for_org(org_id).await?;
        match names.len() {
            0 => Ok(None),
            1 => Ok(names.pop()),
            n => Err(MetadataError::Constraint(format!(
                "org {org_id} has {n} domains"
            ))),
        }
    }

    /// Assign a domain to the org unless it already has one, then return the
    /// org's domain. Losing a race to another caller is not an error: the
    /// winner's name is returned.
    pub async fn create(&self, org_id: &str) -> MetadataResult<String> {
        if org_id.trim().is_empty() {
            return Err(MetadataError::InvalidInput("org_id cannot be blank".to_string()));
        }

        let reserved = self.config.reserved.get(org_id);
        let attempts = if reserved.is_some() {
            1
        } else {
            self.config.max_create_attempts.max(1)
        };

        for attempt in 1..=attempts {
            let candidate = reserved.cloned().unwrap_or_else(generate_domain_name);
            let inserted = self.store.insert_domain(org_id, &candidate).await?;

            if let Some(name) = self.fetch(org_id).await? {
                if inserted {
                    tracing::info!(org_id, domain_name = %name, "Assigned storage domain");
                }
                return Ok(name);
            }

            // Nothing for this org, so the candidate name belongs to another org.
            tracing::warn!(
                org_id,
                candidate = %candidate,
                attempt,
                "Domain name already taken by another org"
            );
        }

        Err(MetadataError::Constraint(format!(
            "could not allocate a domain name for org {org_id} after {attempts} attempts"
        )))
    }

    /// The org's domain, assigning one on first use.
    pub async fn fetch_or_create(&self, org_id: &str) -> MetadataResult<String> {
        if let Some(name) = self.fetch(org_id).await? {
            return Ok(name);
        }
        self.create(org_id).await
    }

    /// All assigned domains.
    pub async fn list(&self) -> MetadataResult<Vec<DomainRow>> {
        self.store.list_domains().await
    }
}
