/// Push broadcast port used by the fan-out
use async_trait::async_trait;
use campus_fcm_shared::{FCMClient, TopicMessage};
use std::sync::Arc;

use crate::error::PushFailure;

#[async_trait]
pub trait PushBroadcaster: Send + Sync {
    /// Deliver `message` to every subscriber of its topic, returning the
    /// provider's message id.
    async fn broadcast(&self, message: &TopicMessage) -> Result<String, PushFailure>;
}

/// `PushBroadcaster` backed by FCM HTTP v1
pub struct FcmPushBroadcaster {
    client: Arc<FCMClient>,
}

impl FcmPushBroadcaster {
    pub fn new(client: Arc<FCMClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushBroadcaster for FcmPushBroadcaster {
    async fn broadcast(&self, message: &TopicMessage) -> Result<String, PushFailure> {
        self.client
            .send_to_topic(message)
            .await
            .map(|result| result.message_id)
            .map_err(|e| PushFailure(e.to_string()))
    }
}
