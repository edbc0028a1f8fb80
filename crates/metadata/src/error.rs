//! Metadata store error types.

use reposync_core::ErrorKind;
use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// A store failure annotated with the synchronization step that hit it.
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<MetadataError>,
    },
}

impl MetadataError {
    /// Wrap an error with the name of the step that produced it.
    pub fn at_stage(stage: &'static str) -> impl FnOnce(MetadataError) -> MetadataError {
        move |source| MetadataError::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Classify this error for retry and reporting decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) | Self::AlreadyExists(_) => ErrorKind::BadValidation,
            Self::Database(sqlx::Error::PoolTimedOut) => ErrorKind::Timeout,
            Self::Stage { source, .. } => source.kind(),
            _ => ErrorKind::Store,
        }
    }
}

impl From<reposync_core::Error> for MetadataError {
    fn from(err: reposync_core::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Whether a database error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_keeps_inner_kind() {
        let err = MetadataError::at_stage("resolve repository")(MetadataError::NotFound(
            "repository 42".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "resolve repository: not found: repository 42");
    }

    #[test]
    fn test_database_errors_are_store_kind() {
        let err = MetadataError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn test_core_errors_are_validation_kind() {
        let err = MetadataError::from(reposync_core::Error::InvalidHash("zz".to_string()));
        assert_eq!(err.kind(), ErrorKind::BadValidation);
    }
}
