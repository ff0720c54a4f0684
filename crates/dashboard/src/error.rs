//! Errors raised while talking to the persistence API.

use domain::GeofenceError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Persistence API returned {status}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid response from persistence API: {0}")]
    InvalidResponse(String),
}

impl ApiClientError {
    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds a status error from a non-2xx response body.
    ///
    /// Bodies in the `{ "error", "message" }` shape are unpacked; anything
    /// else is kept verbatim as the message.
    pub fn from_status_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ApiClientError::Status {
                status,
                code: parsed.error,
                message: parsed.message,
            },
            Err(_) => ApiClientError::Status {
                status,
                code: String::new(),
                message: body.to_string(),
            },
        }
    }
}

/// Error payload returned by the persistence API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl From<ApiClientError> for GeofenceError {
    fn from(err: ApiClientError) -> Self {
        GeofenceError::transport(err)
    }
}
