//! Success/failure classification of remote call results.

use crate::error::LogsError;

/// A remote call result that carries an HTTP status code.
pub trait StatusCode {
    /// HTTP status code the result arrived with.
    fn status_code(&self) -> u16;
}

/// True for status codes in `[200, 300)`.
pub fn is_successful(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}

/// Turns unsuccessful results into [`LogsError::FailedRequest`].
pub trait Verify: StatusCode + Sized {
    /// Verify without a request name.
    fn verify(self) -> Result<Self, LogsError> {
        self.verify_named("")
    }

    /// Return `self` unchanged on success, otherwise fail naming the request.
    fn verify_named(self, request_name: &str) -> Result<Self, LogsError> {
        let status_code = self.status_code();
        if is_successful(status_code) {
            Ok(self)
        } else {
            Err(LogsError::FailedRequest {
                request_name: request_name.to_string(),
                status_code,
            })
        }
    }
}

impl<T: StatusCode> Verify for T {}
