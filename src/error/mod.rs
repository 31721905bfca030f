//! Error types for the CloudWatch Logs integration.
//!
//! Errors are split by origin. The retry policy only ever asks one question
//! of an error, [`LogsError::is_retryable`], so the classification lives here.

mod mapping;

pub use mapping::{map_service_error, parse_error_response, ServiceErrorResponse};

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the CloudWatch Logs integration.
#[derive(Debug, Error)]
pub enum LogsError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential-related errors.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// AWS signing errors.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Network and transport errors.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Response parsing errors.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// A remote call completed with a non-successful status code.
    #[error("Failed AWS {request_name} API request - {status_code}")]
    FailedRequest {
        /// Name of the API request that failed.
        request_name: String,
        /// HTTP status code returned by the service.
        status_code: u16,
    },

    /// The service rejected the call with a structured exception.
    #[error("Service error {code}: {message}")]
    Service {
        /// Service error code (e.g. `ThrottlingException`).
        code: String,
        /// Error message.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// The sequence token sent with an append is no longer current.
    #[error("Stale sequence token: {message}")]
    StaleToken {
        /// Error message from the service.
        message: String,
        /// Token the service expected, when it reported one.
        expected_token: Option<String>,
    },

    /// The writer worker has shut down.
    #[error("Writer closed: no further writes can be processed")]
    WriterClosed,
}

impl LogsError {
    /// Returns true if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LogsError::FailedRequest { .. } => true,
            LogsError::Service { .. } => true,
            LogsError::Network(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the error reports an out-of-date sequence token.
    pub fn is_stale_token(&self) -> bool {
        matches!(self, LogsError::StaleToken { .. })
    }

    /// Returns the HTTP status code if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LogsError::FailedRequest { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the service error code if available.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            LogsError::Service { code, .. } => Some(code),
            LogsError::StaleToken { .. } => Some("InvalidSequenceTokenException"),
            _ => None,
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            LogsError::Service { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Problems with [`crate::config::LogsConfig`].
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No region was configured or found in the environment.
    #[error("Missing region: set it in the config or via AWS_REGION")]
    MissingRegion,

    /// Endpoint override is not a usable URL.
    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        details: String,
    },

    /// A setting is out of range.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// Setting name.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Credential resolution failures.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Every provider came up empty.
    #[error("Credentials not found: no credentials could be loaded from any source")]
    NotFound,

    /// A source had credentials, but unusable ones.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Error message.
        message: String,
    },

    /// The shared credentials file could not be used.
    #[error("Profile error: {message}")]
    ProfileError {
        /// Error message.
        message: String,
    },
}

/// SigV4 failures.
#[derive(Debug, Error)]
pub enum SigningError {
    /// HMAC computation failed.
    #[error("Signature calculation failed: {message}")]
    CalculationFailed {
        /// Error message.
        message: String,
    },

    /// The request URL has no host to sign.
    #[error("Invalid request URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Error message.
        message: String,
    },
}

/// Failures to get any response from the service.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Could not connect, or the connection broke mid-request.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// No response within the read timeout.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// The HTTP client could not be set up.
    #[error("TLS error: {message}")]
    TlsError {
        /// Error message.
        message: String,
    },

    /// Peer closed the connection.
    #[error("Connection reset by peer")]
    ConnectionReset,
}

impl NetworkError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, NetworkError::TlsError { .. })
    }
}

/// A response arrived but could not be understood.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Body was not the expected JSON.
    #[error("JSON error: {message}")]
    Json {
        /// Error message.
        message: String,
    },
}

impl From<serde_json::Error> for LogsError {
    fn from(err: serde_json::Error) -> Self {
        LogsError::Response(ResponseError::Json {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_request_message() {
        let err = LogsError::FailedRequest {
            request_name: "PutLogEvents".to_string(),
            status_code: 500,
        };
        assert_eq!(err.to_string(), "Failed AWS PutLogEvents API request - 500");
        assert_eq!(err.status_code(), Some(500));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LogsError::FailedRequest {
            request_name: String::new(),
            status_code: 503,
        }
        .is_retryable());
        assert!(LogsError::Service {
            code: "ThrottlingException".to_string(),
            message: "Rate exceeded".to_string(),
            request_id: None,
        }
        .is_retryable());
        assert!(LogsError::Network(NetworkError::ConnectionReset).is_retryable());
        assert!(!LogsError::Network(NetworkError::TlsError {
            message: "bad cert".to_string()
        })
        .is_retryable());
    }

    #[test]
    fn test_stale_token_is_not_retryable() {
        let err = LogsError::StaleToken {
            message: "The given sequenceToken is invalid".to_string(),
            expected_token: Some("49590".to_string()),
        };
        assert!(!err.is_retryable());
        assert!(err.is_stale_token());
        assert_eq!(err.error_code(), Some("InvalidSequenceTokenException"));
    }

    #[test]
    fn test_local_errors_are_not_retryable() {
        assert!(!LogsError::WriterClosed.is_retryable());
        assert!(!LogsError::Credentials(CredentialsError::NotFound).is_retryable());
        assert!(!LogsError::Configuration(ConfigurationError::MissingRegion).is_retryable());
    }
}
