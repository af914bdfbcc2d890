//! Error types for the secrets subsystem.

use thiserror::Error;

/// Secrets subsystem error type.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Invalid profile data or unsupported values.
    #[error("invalid profile: {0}")]
    Validation(String),
    /// Base URL failed to parse.
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
    /// Keychain backend failure.
    #[error("keychain error: {0}")]
    Storage(#[from] keyring::Error),
}

impl SecretsError {
    /// Whether the error represents a temporary outage of the platform
    /// keychain backend (locked or inaccessible), as opposed to a permanent
    /// failure the caller should report.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Storage(keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_))
        )
    }
}

/// Convenience result alias for secrets operations.
pub type SecretsResult<T> = Result<T, SecretsError>;
