//! Service error types.

use reposync_core::ErrorKind;

/// Errors surfaced by the service layer.
///
/// Validation findings are reported in the validation response, not here.
/// These are failures that prevent an operation from producing a result.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("metadata error: {0}")]
    Metadata(#[from] reposync_metadata::MetadataError),

    #[error("core error: {0}")]
    Core(#[from] reposync_core::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Metadata(_) => "metadata_error",
            Self::Core(_) => "core_error",
            Self::Http(_) => "http_error",
            Self::Decode(_) => "decode_error",
        }
    }

    /// Classify this error in the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::BadValidation,
            Self::Metadata(err) => err.kind(),
            Self::Core(err) => err.kind(),
            Self::Http(err) if err.is_timeout() => ErrorKind::Timeout,
            Self::Http(_) => ErrorKind::Store,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
