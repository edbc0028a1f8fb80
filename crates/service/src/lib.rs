//! reposync service layer.
//!
//! Wires the metadata store into the operations exposed to callers and to the
//! `reposyncd` binary, and owns the parts that talk to remote repositories.

pub mod error;
pub mod fetch;
pub mod ingest;
pub mod scheduler;
pub mod state;
pub mod validation;

pub use error::{ServiceError, ServiceResult};
pub use fetch::{FetchError, FetchResponse, HttpMetadataFetcher, MetadataFetcher};
pub use ingest::SyncOutcome;
pub use scheduler::OrphanScheduler;
pub use state::Services;
pub use validation::RepositoryValidator;
