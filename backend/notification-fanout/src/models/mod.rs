/// Data types for the admin notification fan-out
///
/// `AdminNotification` is the record as an administrator created it, with
/// every content field optional. `NotificationPayload` is the normalized
/// form that gets denormalized into the global feed and every inbox.
use firestore_rest::{Document, Fields, Value};
use serde::{Deserialize, Serialize};

use crate::error::FanoutError;

/// Server-assigned creation timestamp field on feed entries and inbox items.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Notification record created by an administrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminNotification {
    pub id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
    pub deeplink: Option<String>,
}

impl AdminNotification {
    /// Build from the created document carried by a Firestore trigger.
    ///
    /// The document must live directly under `source_collection`. Fields that
    /// are missing or not strings are treated as absent.
    pub fn from_document(doc: &Document, source_collection: &str) -> Result<Self, FanoutError> {
        let mut segments = doc.name.rsplit('/');
        let id = segments
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FanoutError::InvalidEvent(format!("no document id in {:?}", doc.name)))?;
        let collection = segments.next().unwrap_or_default();
        if collection != source_collection {
            return Err(FanoutError::InvalidEvent(format!(
                "document {} is not in collection {}",
                doc.name, source_collection
            )));
        }

        let text = |field: &str| {
            doc.fields
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Self {
            id: id.to_string(),
            title: text("title"),
            body: text("body"),
            image: text("image"),
            deeplink: text("deeplink"),
        })
    }
}

/// Normalized notification content
///
/// `title` and `body` are never absent; `image` and `deeplink` are either a
/// non-empty string or `None` (stored as null).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub deeplink: Option<String>,
}

/// Substitute defaults for absent fields.
///
/// Empty strings count as absent for `image` and `deeplink`, so a blank URL
/// is stored as null rather than as `""`. Fields that were not strings in the
/// source document were already dropped by
/// [`AdminNotification::from_document`], so a numeric `title` ends up as
/// `""` rather than being carried through.
pub fn normalize(notification: &AdminNotification) -> NotificationPayload {
    let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

    NotificationPayload {
        title: notification.title.clone().unwrap_or_default(),
        body: notification.body.clone().unwrap_or_default(),
        image: non_empty(&notification.image),
        deeplink: non_empty(&notification.deeplink),
    }
}

impl NotificationPayload {
    /// Denormalized content fields shared by feed entries and inbox items.
    pub fn content_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), Value::string(&self.title));
        fields.insert("body".to_string(), Value::string(&self.body));
        fields.insert("image".to_string(), Value::optional_string(self.image.as_deref()));
        fields.insert(
            "deeplink".to_string(),
            Value::optional_string(self.deeplink.as_deref()),
        );
        fields
    }

    /// Fields for a user's inbox item under the given read-flag policy.
    pub fn inbox_fields(&self, read_flag: ReadFlagPolicy) -> Fields {
        let mut fields = self.content_fields();
        if read_flag == ReadFlagPolicy::Reset {
            fields.insert("read".to_string(), Value::BooleanValue(false));
        }
        fields
    }
}

/// How inbox merge-writes treat the client-owned `read` flag
///
/// `Reset` writes `read: false` on every delivery, so a redelivered trigger
/// marks an already-read item unread again.
///
/// `Preserve` never writes the flag. A first delivery therefore creates the
/// item without any `read` field instead of `read: false`; readers must
/// treat a missing flag as unread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFlagPolicy {
    #[default]
    Reset,
    Preserve,
}

/// Result of the best-effort push broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    Sent { message_id: String },
    Failed { reason: String },
}

impl PushOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PushOutcome::Sent { .. })
    }
}

/// Summary of a completed fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    pub notification_id: String,
    pub inbox_writes: usize,
    pub batch_sizes: Vec<usize>,
    pub push: PushOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, fields: &[(&str, Value)]) -> Document {
        Document {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let payload = normalize(&AdminNotification {
            id: "n1".to_string(),
            ..Default::default()
        });

        assert_eq!(payload.title, "");
        assert_eq!(payload.body, "");
        assert_eq!(payload.image, None);
        assert_eq!(payload.deeplink, None);
    }

    #[test]
    fn test_normalize_treats_empty_links_as_absent() {
        let payload = normalize(&AdminNotification {
            id: "n1".to_string(),
            title: Some("Exam timetable".to_string()),
            body: Some("Published on the portal".to_string()),
            image: Some(String::new()),
            deeplink: Some("campus://timetable".to_string()),
        });

        assert_eq!(payload.title, "Exam timetable");
        assert_eq!(payload.image, None);
        assert_eq!(payload.deeplink.as_deref(), Some("campus://timetable"));
    }

    #[test]
    fn test_inbox_fields_by_policy() {
        let payload = NotificationPayload {
            title: "t".to_string(),
            body: "b".to_string(),
            image: None,
            deeplink: None,
        };

        let reset = payload.inbox_fields(ReadFlagPolicy::Reset);
        assert_eq!(reset.get("read"), Some(&Value::BooleanValue(false)));
        assert!(reset.get("image").map(Value::is_null).unwrap_or(false));

        let preserve = payload.inbox_fields(ReadFlagPolicy::Preserve);
        assert!(preserve.get("read").is_none());
        assert_eq!(preserve.len(), 4);
    }

    #[test]
    fn test_from_document() {
        let notification = AdminNotification::from_document(
            &doc(
                "projects/p/databases/(default)/documents/admin_notifications/abc",
                &[
                    ("title", Value::string("Parking closed")),
                    ("body", Value::string("Lot C closed Friday")),
                    ("image", Value::null()),
                    ("priority", Value::IntegerValue("2".to_string())),
                ],
            ),
            "admin_notifications",
        )
        .unwrap();

        assert_eq!(notification.id, "abc");
        assert_eq!(notification.title.as_deref(), Some("Parking closed"));
        assert_eq!(notification.image, None);
        assert_eq!(notification.deeplink, None);
    }

    #[test]
    fn test_non_string_title_normalizes_to_empty() {
        let notification = AdminNotification::from_document(
            &doc(
                "projects/p/databases/(default)/documents/admin_notifications/n9",
                &[
                    ("title", Value::IntegerValue("2024".to_string())),
                    ("body", Value::string("Results are out")),
                ],
            ),
            "admin_notifications",
        )
        .unwrap();

        assert_eq!(notification.title, None);
        let payload = normalize(&notification);
        assert_eq!(payload.title, "");
        assert_eq!(payload.body, "Results are out");
    }

    #[test]
    fn test_from_document_wrong_collection() {
        let result = AdminNotification::from_document(
            &doc("projects/p/databases/(default)/documents/users/abc", &[]),
            "admin_notifications",
        );
        assert!(matches!(result, Err(FanoutError::InvalidEvent(_))));
    }

    #[test]
    fn test_push_outcome_serialization() {
        let sent = serde_json::to_value(PushOutcome::Sent {
            message_id: "m1".to_string(),
        })
        .unwrap();
        assert_eq!(sent["status"], "sent");
        assert_eq!(sent["message_id"], "m1");

        let failed = PushOutcome::Failed {
            reason: "quota".to_string(),
        };
        assert!(!failed.is_sent());
    }
}
