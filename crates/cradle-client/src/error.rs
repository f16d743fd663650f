//! API client error types.

use cradle_commerce::CommerceError;
use thiserror::Error;

/// Errors from talking to the storefront backend.
///
/// A failed fetch is never folded into "no discounts"; callers keep the
/// error and the UI shows it as a distinct state.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be sent or completed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend answered with an error status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body did not parse.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Local pricing failed after a successful fetch.
    #[error("Pricing error: {0}")]
    Pricing(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

impl From<CommerceError> for ApiError {
    fn from(e: CommerceError) -> Self {
        ApiError::Pricing(e.to_string())
    }
}
