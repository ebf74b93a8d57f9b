/// Error types for the notification fan-out
///
/// Fatal failures are variants of `FanoutError` and abort the invocation so
/// the hosting platform redelivers the trigger. The push broadcast never
/// produces a `FanoutError`; its failures are reported as `PushFailure` and
/// folded into `PushOutcome`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use firestore_rest::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Result type for fan-out operations
pub type Result<T> = std::result::Result<T, FanoutError>;

#[derive(Error, Debug)]
pub enum FanoutError {
    /// The trigger payload does not describe a created admin notification
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    /// Global feed entry could not be written
    #[error("Feed write failed for notification {notification_id}: {source}")]
    FeedWrite {
        notification_id: String,
        #[source]
        source: StoreError,
    },

    /// User ids could not be listed
    #[error("User enumeration failed: {0}")]
    UserEnumeration(#[source] StoreError),

    /// At least one inbox batch commit was rejected
    #[error(
        "Fan-out write failure for notification {notification_id}: \
         {failed_batches} of {total_batches} batches failed: {source}"
    )]
    FanOutWriteFailure {
        notification_id: String,
        failed_batches: usize,
        total_batches: usize,
        #[source]
        source: StoreError,
    },
}

/// Best-effort push broadcast failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Push broadcast failed: {0}")]
pub struct PushFailure(pub String);

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
}

impl FanoutError {
    fn error_code(&self) -> &'static str {
        match self {
            FanoutError::InvalidEvent(_) => "INVALID_EVENT",
            FanoutError::FeedWrite { .. } => "FEED_WRITE_FAILURE",
            FanoutError::UserEnumeration(_) => "USER_ENUMERATION_FAILURE",
            FanoutError::FanOutWriteFailure { .. } => "FAN_OUT_WRITE_FAILURE",
        }
    }
}

impl ResponseError for FanoutError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Still non-2xx, so the platform retries it like any failure.
            FanoutError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            FanoutError::FeedWrite { .. }
            | FanoutError::UserEnumeration(_)
            | FanoutError::FanOutWriteFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.error_code(),
            message: self.to_string(),
            status: status.as_u16(),
        })
    }
}
