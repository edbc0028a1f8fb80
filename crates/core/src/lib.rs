//! Core domain types and shared logic for reposync.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Crawled listing items (packages, package groups, environments) and their natural keys
//! - Repository URL normalization
//! - Tenant storage-domain naming
//! - Upload content hashes
//! - Repository validation request/response shapes
//! - Configuration and the shared error taxonomy

pub mod config;
pub mod content;
pub mod domain_name;
pub mod error;
pub mod hash;
pub mod url;
pub mod validation;

pub use content::{ContentItem, ContentKind, Environment, NaturalKey, Package, PackageGroup};
pub use domain_name::{DOMAIN_NAME_LEN, generate_domain_name};
pub use error::{Error, ErrorKind, Result};
pub use hash::Sha256Digest;
pub use url::normalize_repository_url;
pub use validation::{
    GenericAttributeValidation, RepositoryValidationRequest, RepositoryValidationResponse,
    UrlValidation,
};

/// Default number of content rows written per bulk insert statement.
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 1000;

/// Default number of natural keys per lookup query.
/// SQLite caps bound parameters per statement, so lookups stay well below it.
pub const DEFAULT_LOOKUP_BATCH_SIZE: usize = 900;
