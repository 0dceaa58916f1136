//! Error types for the claim engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Business errors
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceExists(String),

    // Validation errors
    #[error("Resource name must not be empty")]
    EmptyResourceName,

    #[error("Claimant id must not be empty")]
    EmptyClaimantId,

    #[error("Capacity must be at least 1")]
    ZeroCapacity,

    // Transient errors, safe to retry
    #[error("Lock acquisition timed out")]
    LockTimeout,

    #[error("Transaction deadline exceeded")]
    DeadlineExceeded,

    #[error("Serialization conflict, transaction must be re-run")]
    SerializationConflict,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl Error {
    /// Whether re-issuing the identical call may legitimately succeed.
    ///
    /// Business and validation errors are stable across retries; only
    /// storage-level failures are retryable.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::LockTimeout
                | Error::DeadlineExceeded
                | Error::SerializationConflict
                | Error::Storage(_)
                | Error::Encoding(_)
        )
    }
}

impl From<fjall::Error> for Error {
    fn from(e: fjall::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encoding(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::LockTimeout.is_transient());
        assert!(Error::SerializationConflict.is_transient());
        assert!(Error::Storage("disk full".to_string()).is_transient());

        assert!(!Error::ResourceNotFound("summer".to_string()).is_transient());
        assert!(!Error::ResourceExists("summer".to_string()).is_transient());
        assert!(!Error::ZeroCapacity.is_transient());
    }
}
