use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accepted FCM send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FCMSendResult {
    /// `projects/{project}/messages/{id}` as returned by FCM
    pub message_id: String,
}

/// Message addressed to every device subscribed to `topic`
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMessage {
    pub topic: String,
    pub title: String,
    pub body: String,
    /// FCM data values must be strings.
    pub data: HashMap<String, String>,
    /// Rich notification image, attached as Android and APNs hints.
    pub image: Option<String>,
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

/// FCM Message Content
#[derive(Debug, Serialize)]
pub struct FcmMessageContent {
    pub topic: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
}

/// FCM Notification Payload
#[derive(Debug, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Serialize)]
pub struct AndroidNotification {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ApnsConfig {
    pub fcm_options: ApnsFcmOptions,
}

#[derive(Debug, Serialize)]
pub struct ApnsFcmOptions {
    pub image: String,
}

impl From<&TopicMessage> for FcmMessage {
    fn from(msg: &TopicMessage) -> Self {
        FcmMessage {
            message: FcmMessageContent {
                topic: msg.topic.clone(),
                notification: FcmNotification {
                    title: msg.title.clone(),
                    body: msg.body.clone(),
                },
                data: msg.data.clone(),
                android: msg.image.as_ref().map(|image| AndroidConfig {
                    notification: AndroidNotification {
                        image: image.clone(),
                    },
                }),
                apns: msg.image.as_ref().map(|image| ApnsConfig {
                    fcm_options: ApnsFcmOptions {
                        image: image.clone(),
                    },
                }),
            },
        }
    }
}

/// FCM API Response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct FcmErrorEnvelope {
    pub error: FcmErrorResponse,
}

#[derive(Debug, Deserialize)]
pub struct FcmErrorResponse {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
}
