//! Error response mapping for the CloudWatch Logs JSON protocol.
//!
//! Error bodies look like:
//!
//! ```json
//! {
//!   "__type": "InvalidSequenceTokenException",
//!   "expectedSequenceToken": "49590302...",
//!   "message": "The given sequenceToken is invalid."
//! }
//! ```

use super::LogsError;
use serde::Deserialize;

/// Parsed service error body.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceErrorResponse {
    /// Error code with any namespace prefix stripped.
    #[serde(rename = "__type", alias = "code", alias = "Code")]
    pub error_type: String,

    /// Human-readable error message.
    #[serde(default, alias = "Message")]
    pub message: String,

    /// Token the service expected, reported on sequence token conflicts.
    #[serde(default, rename = "expectedSequenceToken")]
    pub expected_sequence_token: Option<String>,

    /// AWS request ID, filled from the response headers.
    #[serde(skip)]
    pub request_id: Option<String>,
}

/// Parse a service error body.
///
/// Returns an error if the body is not a JSON error document.
pub fn parse_error_response(body: &[u8]) -> Result<ServiceErrorResponse, LogsError> {
    let mut response: ServiceErrorResponse = serde_json::from_slice(body)?;

    // "com.amazonaws.logs#ResourceNotFoundException" -> "ResourceNotFoundException"
    if let Some(hash_pos) = response.error_type.rfind('#') {
        response.error_type = response.error_type[hash_pos + 1..].to_string();
    }

    Ok(response)
}

/// Map a parsed service error to a typed error.
///
/// Sequence token conflicts become [`LogsError::StaleToken`]; every other
/// service exception becomes [`LogsError::Service`].
pub fn map_service_error(error: ServiceErrorResponse) -> LogsError {
    match error.error_type.as_str() {
        "InvalidSequenceTokenException" | "DataAlreadyAcceptedException" => {
            LogsError::StaleToken {
                message: error.message,
                expected_token: error.expected_sequence_token,
            }
        }
        _ => LogsError::Service {
            code: error.error_type,
            message: error.message,
            request_id: error.request_id,
        },
    }
}
