//! Error types for the registry core.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in registry operations.
///
/// A lookup miss is not an error: retrieval returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV read or write error.
    #[error("table format error: {0}")]
    Csv(#[from] csv::Error),

    /// A lock marker could not be created within the timeout.
    #[error("lock timeout: {resource} still locked after {waited:?}")]
    LockTimeout {
        /// Name of the locked resource.
        resource: String,
        /// How long the caller polled before giving up.
        waited: Duration,
    },

    /// A new identifier could not be issued.
    #[error("id allocation failed: {reason}")]
    AllocationFailed {
        /// Why allocation failed.
        reason: String,
    },

    /// A table or ledger file does not have the expected shape.
    #[error("invalid table format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a lock timeout error.
    pub fn lock_timeout(resource: impl Into<String>, waited: Duration) -> Self {
        Self::LockTimeout {
            resource: resource.into(),
            waited,
        }
    }

    /// Creates an allocation failed error.
    pub fn allocation_failed(reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            reason: reason.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error means a lock could not be obtained,
    /// either directly or while allocating an id.
    #[must_use]
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, Self::LockTimeout { .. } | Self::AllocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_message_names_resource() {
        let err = CoreError::lock_timeout(".infolock", Duration::from_millis(50));
        let msg = err.to_string();
        assert!(msg.contains(".infolock"));
        assert!(err.is_lock_contention());
    }

    #[test]
    fn io_is_not_contention() {
        let err = CoreError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(!err.is_lock_contention());
    }
}
