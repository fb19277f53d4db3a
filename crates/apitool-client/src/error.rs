//! Error types for the client library.

use apitool_common::ConfigError;
use thiserror::Error;

/// Errors that can occur when talking to an API.
///
/// Transport failures are surfaced as the transport raised them: the client
/// does not retry, translate status codes, or recover locally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// Indicates issues like DNS resolution, connection failures, timeouts,
    /// or socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, parsed as JSON when possible.
        body: serde_json::Value,
    },

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Client configuration issue.
    ///
    /// Invalid host or proxy URL, or incompatible settings.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Basic or token authentication was requested without credentials.
    #[error("Username and password are required for {0} authentication")]
    MissingCredentials(&'static str),

    /// A named endpoint is not present in the configuration.
    #[error("Endpoint '{0}' is not configured")]
    MissingEndpoint(String),

    /// A header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The token endpoint answered without a usable token.
    #[error("Token extraction failed: {0}")]
    TokenExtraction(String),
}

impl ClientError {
    /// Returns the HTTP status if the API answered with a non-success status.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error came from a non-success HTTP status.
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Check if the API rejected the request's credentials (HTTP 401 or 403).
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Result type alias using `ClientError`.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = ClientError::Status {
            status: 401,
            body: serde_json::json!({"error": "unauthorized"}),
        };
        assert!(err.is_status());
        assert!(err.is_authentication_error());
        assert_eq!(err.status(), Some(401));

        let err = ClientError::MissingEndpoint("user".to_string());
        assert!(!err.is_status());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Endpoint 'user' is not configured");
    }
}
