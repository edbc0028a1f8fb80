//! Error types for the core domain.

use thiserror::Error;

/// Coarse classification shared by every reposync error type.
///
/// Callers use it to decide whether to retry and how to surface a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced repository or record does not exist. Not retried.
    NotFound,
    /// Caller-supplied input was rejected. Never retried.
    BadValidation,
    /// A remote fetch exceeded its deadline.
    Timeout,
    /// Any other failure talking to the relational store.
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::BadValidation => "bad_validation",
            Self::Timeout => "timeout",
            Self::Store => "store_error",
        }
    }
}

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid content item: {0}")]
    InvalidContent(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::BadValidation
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
