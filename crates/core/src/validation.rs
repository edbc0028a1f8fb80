//! Repository validation request and response shapes.

use serde::{Deserialize, Serialize};

/// Parameters of a repository a tenant intends to create or update.
///
/// Omitted fields are skipped during validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryValidationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    /// Verify the repomd signature with `gpg_key` when set.
    #[serde(default)]
    pub metadata_verification: bool,
    /// Set when validating an update of an existing configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Validation outcome of a single attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericAttributeValidation {
    /// Skipped if the attribute was not supplied.
    pub skipped: bool,
    /// Valid if not skipped and the attribute passed every check.
    pub valid: bool,
    #[serde(default)]
    pub error: String,
}

impl GenericAttributeValidation {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            valid: false,
            error: String::new(),
        }
    }

    pub fn invalid(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.error = error.into();
    }
}

/// Validation outcome of the repository URL, including remote metadata probes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlValidation {
    pub skipped: bool,
    pub valid: bool,
    #[serde(default)]
    pub error: String,
    /// True if `repodata/repomd.xml` was fetched with a 2xx status.
    pub metadata_present: bool,
    /// True if `repodata/repomd.xml.asc` was found.
    pub metadata_signature_present: bool,
    /// Status of the repomd fetch, or 0 if no response was received.
    pub http_code: u16,
}

impl UrlValidation {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn invalid(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.error = error.into();
    }
}

/// Per-attribute validation result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryValidationResponse {
    pub name: GenericAttributeValidation,
    pub url: UrlValidation,
    pub gpg_key: GenericAttributeValidation,
}
