//! Error types for option store operations
//!
//! Only backing-store failures surface as errors. An invalid scope, a missing
//! option and a skipped update are ordinary return values of the engine, so
//! callers that branch on the returned value never have to match on these.

use thiserror::Error;

/// Failure reported by a [`StoreAdapter`](crate::store::StoreAdapter)
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem error from a file-backed store
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be encoded or decoded
    #[error("Store serialization error: {0}")]
    Serialization(String),

    /// Persisted data is readable but not a valid option row
    #[error("Corrupt row {scope}:{name}: {reason}")]
    Corrupt {
        scope: String,
        name: String,
        reason: String,
    },
}

/// Result type alias for store adapter calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum OptionError {
    /// Propagated unmodified from the store adapter; the engine never retries
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, OptionError>;

impl From<String> for OptionError {
    fn from(s: String) -> Self {
        OptionError::Other(s)
    }
}

impl From<&str> for OptionError {
    fn from(s: &str) -> Self {
        OptionError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl OptionError {
    /// True when the failure came from the backing store being unreachable
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, OptionError::Store(StoreError::Unavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(error.to_string(), "Store unavailable: connection refused");

        let corrupt = StoreError::Corrupt {
            scope: "1".to_string(),
            name: "blogname".to_string(),
            reason: "bad autoload marker".to_string(),
        };
        assert!(corrupt.to_string().contains("1:blogname"));

        let wrapped: OptionError = StoreError::Unavailable("down".to_string()).into();
        assert_eq!(wrapped.to_string(), "Store unavailable: down");
        assert!(wrapped.is_store_unavailable());
    }

    #[test]
    fn test_error_conversion() {
        let error: OptionError = "test error".into();
        assert!(matches!(error, OptionError::Other(_)));

        let error: OptionError = "test error".to_string().into();
        assert!(matches!(error, OptionError::Other(_)));
        assert!(!error.is_store_unavailable());
    }
}
