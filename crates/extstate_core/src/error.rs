//! Error types for extstate core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in session accessor operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The underlying store rejected a `get`, `set` or `remove`.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] extstate_storage::StorageError),

    /// A stored value does not have the shape its field expects.
    #[error("malformed value under key {key:?}: {message}")]
    MalformedValue {
        /// The store key holding the value.
        key: String,
        /// Description of the decode failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed-value error for `key`.
    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from the underlying store.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, CoreError::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extstate_storage::StorageError;

    #[test]
    fn storage_errors_convert() {
        let err: CoreError = StorageError::Closed.into();
        assert!(err.is_storage_unavailable());
        assert_eq!(err.to_string(), "storage unavailable: store is closed");
    }

    #[test]
    fn malformed_display() {
        let err = CoreError::malformed("userConsent", "expected a boolean");
        assert!(!err.is_storage_unavailable());
        assert!(err.to_string().contains("userConsent"));
        assert!(err.to_string().contains("expected a boolean"));
    }
}
