//! Kernel error types.

use thiserror::Error;

/// Kernel errors.
///
/// `Configuration` signals a deployment defect (bad codec registration,
/// invalid container definition) and is never recoverable at runtime. The
/// remaining variants are surfaced to the operator at the service boundary.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{kind} `{id}` does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid snapshot data: {0}")]
    DataIntegrity(String),

    /// Deliberately uniform: a failed import reveals nothing about whether
    /// the blob was corrupted, tampered with, or signed with another secret.
    #[error("Snapshot is invalid.")]
    InvalidSnapshot,

    #[error("access denied")]
    AccessDenied,

    #[error("serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error")]
    Storage(#[from] anyhow::Error),
}

impl KernelError {
    /// Shorthand for a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type alias using KernelError.
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_missing_record() {
        let err = KernelError::not_found("container", "sidebar");
        assert_eq!(err.to_string(), "container `sidebar` does not exist");
    }

    #[test]
    fn invalid_snapshot_message_is_generic() {
        // The import failure message must not leak why verification failed.
        assert_eq!(
            KernelError::InvalidSnapshot.to_string(),
            "Snapshot is invalid."
        );
    }
}
