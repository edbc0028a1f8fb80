//! Tenant storage-domain repository.

use crate::error::MetadataResult;
use crate::models::DomainRow;
use async_trait::async_trait;

/// Repository for tenant domain rows.
#[async_trait]
pub trait DomainRepo: Send + Sync {
    /// Insert a domain unless it conflicts with an existing row on either
    /// `org_id` or `domain_name`. Returns whether a row was inserted.
    async fn insert_domain(&self, org_id: &str, domain_name: &str) -> MetadataResult<bool>;

    /// All domain names recorded for an org.
    async fn domain_names_for_org(&self, org_id: &str) -> MetadataResult<Vec<String>>;

    /// List all domains ordered by org.
    async fn list_domains(&self) -> MetadataResult<Vec<DomainRow>>;
}
