//! Configuration types shared across crates.

use crate::ContentKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments only).
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Query timeout in seconds (advisory only - SQLite cannot force-cancel queries).
        /// Logs warnings for operations exceeding this duration.
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host (e.g., "localhost" or "db.example.com").
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer REPOSYNC_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds.
        /// PostgreSQL cancels statements that exceed this duration.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(300000) // 5 minutes
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(600) // advisory only
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/reposync.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                ..
            } => match (url.as_ref(), host.as_ref(), database.as_ref()) {
                (Some(_), _, _) => Ok(()),
                (None, Some(_), Some(_)) => Ok(()),
                (None, None, _) => {
                    Err("postgres config requires either 'url' or 'host' + 'database'".to_string())
                }
                (None, Some(_), None) => Err(
                    "postgres config requires 'database' when using individual fields".to_string(),
                ),
            },
        }
    }
}

/// Content synchronization configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of content rows per bulk insert statement.
    #[serde(default = "default_sync_batch_size")]
    pub batch_size: usize,
    /// Maximum number of natural keys per lookup query.
    #[serde(default = "default_lookup_batch_size")]
    pub lookup_batch_size: usize,
}

fn default_sync_batch_size() -> usize {
    crate::DEFAULT_SYNC_BATCH_SIZE
}

fn default_lookup_batch_size() -> usize {
    crate::DEFAULT_LOOKUP_BATCH_SIZE
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_sync_batch_size(),
            lookup_batch_size: default_lookup_batch_size(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("sync.batch_size cannot be 0".to_string());
        }
        if self.lookup_batch_size == 0 {
            return Err("sync.lookup_batch_size cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Orphan collection configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrphanConfig {
    /// Enable periodic orphan collection (disabled by default).
    #[serde(default)]
    pub auto_schedule_enabled: bool,
    /// Interval in seconds between automatic runs (default: 1 hour).
    #[serde(default = "default_orphan_interval_secs")]
    pub interval_secs: u64,
    /// Which content kinds to collect (default: all).
    #[serde(default = "default_orphan_kinds")]
    pub kinds: Vec<ContentKind>,
}

fn default_orphan_interval_secs() -> u64 {
    3600
}

fn default_orphan_kinds() -> Vec<ContentKind> {
    ContentKind::ALL.to_vec()
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self {
            auto_schedule_enabled: false,
            interval_secs: default_orphan_interval_secs(),
            kinds: default_orphan_kinds(),
        }
    }
}

impl OrphanConfig {
    /// Get the schedule interval as a std::time::Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        // A zero interval would spin the scheduler loop
        if self.auto_schedule_enabled && self.interval_secs == 0 {
            return Err("orphans.interval_secs cannot be 0 when scheduling is enabled".to_string());
        }
        Ok(())
    }
}

/// Tenant storage-domain configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Fixed domain names for specific orgs, keyed by org_id.
    #[serde(default)]
    pub reserved: BTreeMap<String, String>,
    /// How many fresh candidates to try when a generated name collides.
    #[serde(default = "default_max_create_attempts")]
    pub max_create_attempts: u32,
}

fn default_max_create_attempts() -> u32 {
    5
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            reserved: BTreeMap::new(),
            max_create_attempts: default_max_create_attempts(),
        }
    }
}

impl DomainConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_create_attempts == 0 {
            return Err("domains.max_create_attempts cannot be 0".to_string());
        }
        for (org_id, name) in &self.reserved {
            if name.trim().is_empty() {
                return Err(format!("domains.reserved entry for org '{org_id}' is blank"));
            }
        }
        Ok(())
    }
}

/// An org whose repositories are shared with every tenant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservedOrg {
    pub org_id: String,
    /// Human label used in validation messages (e.g. "Red Hat").
    pub label: String,
}

/// Repository validation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Deadline for each remote metadata fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// User-Agent header sent with metadata fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Orgs whose URLs may not be re-registered by tenants.
    #[serde(default = "default_reserved_orgs")]
    pub reserved_orgs: Vec<ReservedOrg>,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("reposync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_reserved_orgs() -> Vec<ReservedOrg> {
    vec![
        ReservedOrg {
            org_id: "-1".to_string(),
            label: "Red Hat".to_string(),
        },
        ReservedOrg {
            org_id: "-2".to_string(),
            label: "Community".to_string(),
        },
    ]
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            reserved_orgs: default_reserved_orgs(),
        }
    }
}

impl ValidationConfig {
    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_timeout_secs == 0 {
            return Err("validation.fetch_timeout_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub orphans: OrphanConfig,
    #[serde(default)]
    pub domains: DomainConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl AppConfig {
    /// Create a test configuration with an in-memory-friendly SQLite default.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> crate::Result<()> {
        self.metadata
            .validate()
            .and_then(|_| self.sync.validate())
            .and_then(|_| self.orphans.validate())
            .and_then(|_| self.domains.validate())
            .and_then(|_| self.validation.validate())
            .map_err(crate::Error::InvalidConfig)
    }
}
