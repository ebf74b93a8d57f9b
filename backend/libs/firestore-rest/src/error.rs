//! Error types for the Firestore client.

use gcp_oauth::AuthError;
use thiserror::Error;

/// Result type alias for Firestore operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to Firestore.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not obtain an access token
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Transport-level failure (DNS, TLS, connection reset, timeout)
    #[error("Request failed: {0}")]
    Request(String),

    /// Firestore rejected the call
    #[error("Firestore API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to parse Firestore response: {0}")]
    ResponseParse(String),

    /// Commit exceeded the per-request write limit
    #[error("Commit of {size} writes exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}
