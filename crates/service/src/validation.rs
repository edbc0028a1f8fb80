//! Repository validation flow.
//!
//! Checks the parameters a tenant supplies for a repository before it is
//! created or updated:
//!
//! - the name is present and unused within the org
//! - the URL is present, not owned by a reserved org, unused within the org
//!   and free of whitespace
//! - `repodata/repomd.xml` can be fetched
//! - if a GPG key is given, it loads, and with metadata verification enabled
//!   it verifies the detached `repomd.xml.asc` signature
//!
//! Findings go into the [`RepositoryValidationResponse`]. Only store failures
//! are returned as errors.

use crate::error::ServiceResult;
use crate::fetch::{MetadataFetcher, REPOMD_PATH, REPOMD_SIGNATURE_PATH};
use reposync_core::config::{ReservedOrg, ValidationConfig};
use reposync_core::url::contains_whitespace;
use reposync_core::{
    GenericAttributeValidation, RepositoryValidationRequest, RepositoryValidationResponse,
    UrlValidation, normalize_repository_url,
};
use reposync_gpg::{KeyRing, verify_detached};
use reposync_metadata::MetadataStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct RepositoryValidator {
    store: Arc<dyn MetadataStore>,
    fetcher: Arc<dyn MetadataFetcher>,
    reserved_orgs: Vec<ReservedOrg>,
}

impl RepositoryValidator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        fetcher: Arc<dyn MetadataFetcher>,
        config: &ValidationConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            reserved_orgs: config.reserved_orgs.clone(),
        }
    }

    /// Validate repository parameters for `org_id`.
    ///
    /// Configurations in `excluded_uuids` are ignored by the duplicate checks,
    /// so an update does not collide with the configuration being updated.
    pub async fn validate_parameters(
        &self,
        org_id: &str,
        request: &RepositoryValidationRequest,
        excluded_uuids: &[Uuid],
    ) -> ServiceResult<RepositoryValidationResponse> {
        let mut response = RepositoryValidationResponse {
            name: match request.name.as_deref() {
                None => GenericAttributeValidation::skipped(),
                Some(name) => self.validate_name(org_id, name, excluded_uuids).await?,
            },
            ..RepositoryValidationResponse::default()
        };

        let Some(raw_url) = request.url.as_deref() else {
            response.url = UrlValidation::skipped();
            return Ok(response);
        };

        let url = normalize_repository_url(raw_url);
        response.url = self.validate_url(org_id, &url, excluded_uuids).await?;
        if !response.url.valid {
            return Ok(response);
        }

        if let Some(repomd) = self.check_metadata_presence(&url, &mut response.url).await {
            self.check_signature(&url, request, &repomd, &mut response)
                .await;
        }

        tracing::debug!(
            org_id,
            url = %url,
            metadata_present = response.url.metadata_present,
            signature_present = response.url.metadata_signature_present,
            "Validated repository parameters"
        );
        Ok(response)
    }

    async fn validate_name(
        &self,
        org_id: &str,
        name: &str,
        excluded_uuids: &[Uuid],
    ) -> ServiceResult<GenericAttributeValidation> {
        let mut result = GenericAttributeValidation::default();
        if name.trim().is_empty() {
            result.invalid("Name cannot be blank");
            return Ok(result);
        }

        if self
            .store
            .repository_name_in_use(org_id, name, excluded_uuids)
            .await?
        {
            result.invalid(format!("A repository with the name '{name}' already exists."));
            return Ok(result);
        }

        result.valid = true;
        Ok(result)
    }

    /// `url` must already be normalized.
    async fn validate_url(
        &self,
        org_id: &str,
        url: &str,
        excluded_uuids: &[Uuid],
    ) -> ServiceResult<UrlValidation> {
        let mut result = UrlValidation::default();
        if url.is_empty() {
            result.invalid("URL cannot be blank");
            return Ok(result);
        }

        if let Some(owner) = self.reserved_owner(url).await? {
            result.invalid(format!("{} repository with this URL already exists", owner.label));
            return Ok(result);
        }

        if self
            .store
            .repository_url_in_use(org_id, url, excluded_uuids)
            .await?
        {
            result.invalid(format!("A repository with the URL '{url}' already exists."));
            return Ok(result);
        }

        if contains_whitespace(url) {
            result.invalid("URL cannot contain whitespace.");
            return Ok(result);
        }

        result.valid = true;
        Ok(result)
    }

    /// The first configured reserved org that already holds `url`.
    async fn reserved_owner(&self, url: &str) -> ServiceResult<Option<&ReservedOrg>> {
        if self.reserved_orgs.is_empty() {
            return Ok(None);
        }
        let owners = self.store.org_ids_for_url(url).await?;
        Ok(self
            .reserved_orgs
            .iter()
            .find(|reserved| owners.contains(&reserved.org_id)))
    }

    /// Fetch repomd and record the outcome on `result`. Returns the repomd
    /// body when the fetch succeeded with a 2xx status.
    async fn check_metadata_presence(
        &self,
        url: &str,
        result: &mut UrlValidation,
    ) -> Option<Vec<u8>> {
        let repomd_url = format!("{url}{REPOMD_PATH}");
        match self.fetcher.fetch(&repomd_url).await {
            Ok(response) => {
                result.http_code = response.status;
                result.metadata_present = response.is_success();
                if result.metadata_present {
                    Some(response.body)
                } else {
                    result.error = format!(
                        "Error fetching YUM metadata: Cannot fetch {repomd_url}: {}",
                        response.status
                    );
                    None
                }
            }
            Err(err) => {
                tracing::debug!(url = %repomd_url, error = %err, "Metadata fetch failed");
                result.http_code = 0;
                result.metadata_present = false;
                result.error = format!("Error fetching YUM metadata: {err}");
                None
            }
        }
    }

    async fn check_signature(
        &self,
        url: &str,
        request: &RepositoryValidationRequest,
        repomd: &[u8],
        response: &mut RepositoryValidationResponse,
    ) {
        let mut gpg_key = GenericAttributeValidation::default();
        let ring = match request.gpg_key.as_deref() {
            Some(text) if !text.trim().is_empty() => match KeyRing::from_armored(text) {
                Ok(ring) => {
                    gpg_key.valid = true;
                    Some(ring)
                }
                Err(err) => {
                    gpg_key.invalid(format!(
                        "Error loading GPG Key: {err}.  Is this a valid GPG Key?"
                    ));
                    None
                }
            },
            _ => {
                gpg_key.skipped = true;
                gpg_key.valid = true;
                None
            }
        };

        let signature_url = format!("{url}{REPOMD_SIGNATURE_PATH}");
        let signature = match self.fetcher.fetch(&signature_url).await {
            Ok(fetched) if fetched.is_success() && !fetched.body.is_empty() => Some(fetched.body),
            Ok(fetched) => {
                tracing::debug!(url = %signature_url, status = fetched.status, "No repomd signature");
                None
            }
            Err(err) => {
                tracing::debug!(url = %signature_url, error = %err, "Signature fetch failed");
                None
            }
        };

        response.url.metadata_signature_present = signature.is_some();
        if let (Some(ring), Some(signature)) = (ring, signature)
            && request.metadata_verification
            && let Err(err) = verify_detached(&ring, repomd, &signature)
        {
            gpg_key.invalid(format!(
                "Error validating signature: {err}. Is this the correct GPG Key?"
            ));
        }
        response.gpg_key = gpg_key;
    }
}
