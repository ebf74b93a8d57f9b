use gcp_oauth::AuthError;
use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug)]
pub enum FCMError {
    #[error("Failed to get access token: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid topic name: {0}")]
    InvalidTopic(String),

    #[error("FCM topic send request failed: {0}")]
    TopicSendError(String),

    #[error("Failed to parse FCM response: {0}")]
    ResponseParseError(String),

    #[error("FCM API error: {0} - {1}")]
    ApiError(String, String),
}
