//! GPG error types.

use thiserror::Error;

/// Key loading and verification errors.
#[derive(Debug, Error)]
pub enum GpgError {
    #[error("no public key found")]
    NoKeys,

    #[error("key parsing error: {0}")]
    KeyParsing(String),

    #[error("invalid signature format: {0}")]
    InvalidSignature(String),

    #[error("signature made by unknown entity")]
    VerificationFailed,
}

/// Result type for GPG operations.
pub type GpgResult<T> = std::result::Result<T, GpgError>;
