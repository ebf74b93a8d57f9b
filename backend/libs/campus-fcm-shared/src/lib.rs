/// Campus FCM Shared Library
///
/// Firebase Cloud Messaging (HTTP v1) client used to broadcast notifications
/// to every device subscribed to a topic.
///
/// It handles:
/// - Bearer tokens via a pluggable `gcp_oauth::AccessTokenProvider`
/// - Topic messages with a string data payload
/// - Rich image hints for Android and APNs

pub mod client;
pub mod models;
pub mod errors;

pub use client::FCMClient;
pub use models::{FCMSendResult, TopicMessage};
pub use errors::FCMError;
