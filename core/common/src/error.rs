//! Common error types for DriveAgent.

use thiserror::Error;

/// Top-level error type for DriveAgent operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider rejected our credentials, or a token refresh failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The provider refused access to a resource.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Transport failure or unexpected provider response.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Process configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("file abc".to_string());
        assert_eq!(err.to_string(), "Not found: file abc");

        let err = Error::Config("Missing required environment variables: A, B".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variables: A, B"
        );
    }
}
