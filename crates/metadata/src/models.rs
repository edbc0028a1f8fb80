//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Repositories
// =============================================================================

/// A remote repository, shared by every tenant that configured its URL.
#[derive(Debug, Clone, FromRow)]
pub struct RepositoryRow {
    pub uuid: Uuid,
    /// Normalized URL, always ending in a single `/`.
    pub url: String,
    pub last_introspection_status: Option<String>,
    pub last_introspection_time: Option<OffsetDateTime>,
    pub last_introspection_error: Option<String>,
    pub package_count: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Outcome of one crawl-and-sync pass over a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionRecord {
    /// e.g. "Valid", "Invalid", "Unavailable".
    pub status: String,
    pub error: Option<String>,
    /// Leaves the stored count untouched when `None`.
    pub package_count: Option<i64>,
    pub introspected_at: OffsetDateTime,
}

// =============================================================================
// Repository configurations
// =============================================================================

/// A tenant's view of a repository.
#[derive(Debug, Clone, FromRow)]
pub struct RepositoryConfigRow {
    pub uuid: Uuid,
    pub name: String,
    pub org_id: String,
    pub repository_uuid: Uuid,
    pub arch: String,
    /// JSON array of distribution versions.
    pub versions: String,
    pub gpg_key: String,
    pub metadata_verification: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl RepositoryConfigRow {
    pub fn versions(&self) -> Vec<String> {
        serde_json::from_str(&self.versions).unwrap_or_default()
    }
}

/// Parameters for creating a repository configuration.
#[derive(Debug, Clone, Default)]
pub struct NewRepositoryConfig {
    pub name: String,
    pub org_id: String,
    /// Raw URL; normalized before it is stored.
    pub url: String,
    pub arch: String,
    pub versions: Vec<String>,
    pub gpg_key: String,
    pub metadata_verification: bool,
}

// =============================================================================
// Tenant storage domains
// =============================================================================

/// A tenant's storage-domain assignment. Never updated or deleted.
#[derive(Debug, Clone, FromRow)]
pub struct DomainRow {
    pub org_id: String,
    pub domain_name: String,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Resumable uploads
// =============================================================================

/// A resumable chunked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    pub upload_uuid: String,
    pub org_id: String,
    /// Lowercase hex SHA-256 of the whole file.
    pub sha256: String,
    pub chunk_size: i64,
    /// Completed chunk hashes in completion order, without duplicates.
    pub chunk_list: Vec<String>,
    pub created_at: OffsetDateTime,
}
