use gcp_oauth::AccessTokenProvider;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::FCMError;
use crate::models::*;

const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Firebase Cloud Messaging Client
///
/// Sends topic broadcasts through the FCM HTTP v1 API. Authentication is
/// delegated to an `AccessTokenProvider` so the same client works with a
/// service account key or the metadata server.
pub struct FCMClient {
    pub project_id: String,
    base_url: String,
    token_provider: Arc<dyn AccessTokenProvider>,
    http_client: reqwest::Client,
}

impl FCMClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `token_provider` - OAuth2 token source
    /// * `http_client` - Shared HTTP client
    pub fn new(
        project_id: String,
        token_provider: Arc<dyn AccessTokenProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            project_id,
            base_url: FCM_BASE_URL.to_string(),
            token_provider,
            http_client,
        }
    }

    /// Point the client at a different host (emulators, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Send notification to topic
    pub async fn send_to_topic(&self, message: &TopicMessage) -> Result<FCMSendResult, FCMError> {
        if !Self::is_valid_topic(&message.topic) {
            return Err(FCMError::InvalidTopic(message.topic.clone()));
        }

        let access_token = self.token_provider.access_token().await?;
        let payload = FcmMessage::from(message);

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FCMError::TopicSendError(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let fcm_response: FcmApiResponse = response
                    .json()
                    .await
                    .map_err(|e| FCMError::ResponseParseError(e.to_string()))?;

                let message_id = fcm_response
                    .name
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                debug!(topic = %message.topic, message_id = %message_id, "FCM topic message accepted");

                Ok(FCMSendResult { message_id })
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                Err(FCMError::ApiError(
                    status.to_string(),
                    Self::describe_error(&error_text),
                ))
            }
        }
    }

    /// Topic names follow `[a-zA-Z0-9-_.~%]+`.
    pub fn is_valid_topic(topic: &str) -> bool {
        !topic.is_empty()
            && topic.len() <= 900
            && topic
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'))
    }

    fn describe_error(body: &str) -> String {
        match serde_json::from_str::<FcmErrorEnvelope>(body) {
            Ok(envelope) => format!(
                "{}: {}",
                envelope.error.status.unwrap_or_else(|| "UNKNOWN".to_string()),
                envelope.error.message.unwrap_or_default()
            ),
            Err(_) => body.to_string(),
        }
    }
}
