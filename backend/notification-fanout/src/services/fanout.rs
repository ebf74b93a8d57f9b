/// Admin notification fan-out
///
/// For every created admin notification:
/// 1. Merge-upsert the global feed entry
/// 2. List every user id
/// 3. Merge-write one inbox item per user, in concurrent batches
/// 4. Broadcast a push notification to the shared topic (best effort)
///
/// All writes are merges keyed by the notification id, so a redelivered
/// trigger converges on the same documents instead of duplicating them.
use campus_fcm_shared::TopicMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::batching::{chunk_writes, commit_all, MAX_BATCH_WRITES};
use super::push::PushBroadcaster;
use super::store::{DocumentStore, DocumentWrite};
use crate::error::FanoutError;
use crate::metrics;
use crate::models::{
    normalize, AdminNotification, FanoutReport, NotificationPayload, PushOutcome, ReadFlagPolicy,
    CREATED_AT_FIELD,
};

/// Collection layout and limits for the fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutOptions {
    pub source_collection: String,
    pub feed_collection: String,
    pub users_collection: String,
    pub inbox_collection: String,
    pub inbox_subcollection: String,
    pub topic: String,
    pub max_batch_writes: usize,
    pub read_flag: ReadFlagPolicy,
}

impl Default for FanoutOptions {
    fn default() -> Self {
        Self {
            source_collection: "admin_notifications".to_string(),
            feed_collection: "notifications".to_string(),
            users_collection: "users".to_string(),
            inbox_collection: "userNotifications".to_string(),
            inbox_subcollection: "items".to_string(),
            topic: "all".to_string(),
            max_batch_writes: MAX_BATCH_WRITES,
            read_flag: ReadFlagPolicy::Reset,
        }
    }
}

pub struct NotificationFanoutHandler {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushBroadcaster>,
    options: FanoutOptions,
}

impl NotificationFanoutHandler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushBroadcaster>,
        options: FanoutOptions,
    ) -> Self {
        Self {
            store,
            push,
            options,
        }
    }

    pub fn options(&self) -> &FanoutOptions {
        &self.options
    }

    /// Fan a newly created notification out to the feed, every inbox and
    /// the push topic.
    ///
    /// Store failures abort with an error so the trigger is redelivered;
    /// nothing already written is rolled back. A failed push broadcast is
    /// logged and reported in [`FanoutReport::push`] only.
    #[instrument(skip_all, fields(notification_id = %notification.id))]
    pub async fn handle(&self, notification: &AdminNotification) -> Result<FanoutReport, FanoutError> {
        let payload = normalize(notification);
        let id = notification.id.as_str();

        match self.fan_out(id, &payload).await {
            Ok(batch_sizes) => {
                let inbox_writes = batch_sizes.iter().sum();
                metrics::record_fanout(true, inbox_writes);

                let push = self.broadcast(&payload).await;
                info!(
                    users = inbox_writes,
                    batches = batch_sizes.len(),
                    push_sent = push.is_sent(),
                    "Notification fanned out"
                );

                Ok(FanoutReport {
                    notification_id: id.to_string(),
                    inbox_writes,
                    batch_sizes,
                    push,
                })
            }
            Err(e) => {
                metrics::record_fanout(false, 0);
                error!(error = %e, "Notification fan-out failed");
                Err(e)
            }
        }
    }

    /// Durable part of the fan-out. Returns the size of every committed batch.
    async fn fan_out(&self, id: &str, payload: &NotificationPayload) -> Result<Vec<usize>, FanoutError> {
        self.store
            .merge_document(self.feed_write(id, payload))
            .await
            .map_err(|source| FanoutError::FeedWrite {
                notification_id: id.to_string(),
                source,
            })?;

        let user_ids = self
            .store
            .list_ids(&self.options.users_collection)
            .await
            .map_err(FanoutError::UserEnumeration)?;

        let writes = user_ids
            .iter()
            .map(|user_id| self.inbox_write(user_id, id, payload))
            .collect();
        let batches = chunk_writes(writes, self.options.max_batch_writes.min(MAX_BATCH_WRITES));
        let batch_sizes: Vec<usize> = batches.iter().map(Vec::len).collect();

        let summary = commit_all(self.store.as_ref(), batches).await;
        metrics::record_batches(summary.committed, summary.failed());

        let failed_batches = summary.failed();
        let total_batches = summary.total();
        if let Some(source) = summary.errors.into_iter().next() {
            return Err(FanoutError::FanOutWriteFailure {
                notification_id: id.to_string(),
                failed_batches,
                total_batches,
                source,
            });
        }

        Ok(batch_sizes)
    }

    async fn broadcast(&self, payload: &NotificationPayload) -> PushOutcome {
        let message = self.topic_message(payload);

        match self.push.broadcast(&message).await {
            Ok(message_id) => {
                metrics::record_push(true);
                PushOutcome::Sent { message_id }
            }
            Err(failure) => {
                metrics::record_push(false);
                error!(topic = %message.topic, error = %failure, "FCM send failed");
                PushOutcome::Failed {
                    reason: failure.0,
                }
            }
        }
    }

    pub fn feed_write(&self, id: &str, payload: &NotificationPayload) -> DocumentWrite {
        DocumentWrite {
            path: format!("{}/{}", self.options.feed_collection, id),
            fields: payload.content_fields(),
            server_timestamps: vec![CREATED_AT_FIELD.to_string()],
        }
    }

    pub fn inbox_write(&self, user_id: &str, id: &str, payload: &NotificationPayload) -> DocumentWrite {
        DocumentWrite {
            path: format!(
                "{}/{}/{}/{}",
                self.options.inbox_collection, user_id, self.options.inbox_subcollection, id
            ),
            fields: payload.inbox_fields(self.options.read_flag),
            server_timestamps: vec![CREATED_AT_FIELD.to_string()],
        }
    }

    pub fn topic_message(&self, payload: &NotificationPayload) -> TopicMessage {
        let mut data = HashMap::new();
        data.insert(
            "deeplink".to_string(),
            payload.deeplink.clone().unwrap_or_default(),
        );

        TopicMessage {
            topic: self.options.topic.clone(),
            title: payload.title.clone(),
            body: payload.body.clone(),
            data,
            image: payload.image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PushFailure;
    use async_trait::async_trait;
    use firestore_rest::{StoreResult, Value};

    struct NullStore;

    #[async_trait]
    impl DocumentStore for NullStore {
        async fn merge_document(&self, _write: DocumentWrite) -> StoreResult<()> {
            Ok(())
        }

        async fn list_ids(&self, _collection: &str) -> StoreResult<Vec<String>> {
            Ok(vec![])
        }

        async fn commit_batch(&self, _writes: Vec<DocumentWrite>) -> StoreResult<()> {
            Ok(())
        }
    }

    struct NullPush;

    #[async_trait]
    impl PushBroadcaster for NullPush {
        async fn broadcast(&self, _message: &TopicMessage) -> Result<String, PushFailure> {
            Ok("m".to_string())
        }
    }

    fn handler(options: FanoutOptions) -> NotificationFanoutHandler {
        NotificationFanoutHandler::new(Arc::new(NullStore), Arc::new(NullPush), options)
    }

    fn payload(image: Option<&str>, deeplink: Option<&str>) -> NotificationPayload {
        NotificationPayload {
            title: "Snow day".to_string(),
            body: "Campus closed".to_string(),
            image: image.map(str::to_string),
            deeplink: deeplink.map(str::to_string),
        }
    }

    #[test]
    fn test_document_paths() {
        let handler = handler(FanoutOptions::default());
        let payload = payload(None, None);

        assert_eq!(handler.feed_write("n1", &payload).path, "notifications/n1");
        assert_eq!(
            handler.inbox_write("u1", "n1", &payload).path,
            "userNotifications/u1/items/n1"
        );
    }

    #[test]
    fn test_feed_entry_has_no_read_flag() {
        let handler = handler(FanoutOptions::default());
        let write = handler.feed_write("n1", &payload(None, None));

        assert!(write.fields.get("read").is_none());
        assert_eq!(write.server_timestamps, vec!["createdAt".to_string()]);
    }

    #[test]
    fn test_inbox_write_follows_read_policy() {
        let reset = handler(FanoutOptions::default()).inbox_write("u1", "n1", &payload(None, None));
        assert_eq!(reset.fields.get("read"), Some(&Value::BooleanValue(false)));

        let preserve = handler(FanoutOptions {
            read_flag: ReadFlagPolicy::Preserve,
            ..FanoutOptions::default()
        })
        .inbox_write("u1", "n1", &payload(None, None));
        assert!(preserve.fields.get("read").is_none());
    }

    #[test]
    fn test_topic_message_defaults_deeplink_to_empty() {
        let handler = handler(FanoutOptions::default());

        let message = handler.topic_message(&payload(None, None));
        assert_eq!(message.topic, "all");
        assert_eq!(message.data.get("deeplink").map(String::as_str), Some(""));
        assert_eq!(message.image, None);

        let message = handler.topic_message(&payload(Some("https://img"), Some("campus://x")));
        assert_eq!(message.data.get("deeplink").map(String::as_str), Some("campus://x"));
        assert_eq!(message.image.as_deref(), Some("https://img"));
    }
}
