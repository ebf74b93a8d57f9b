/// Firestore document-created trigger endpoint
///
/// Accepts the JSON form of a Firestore `document.create` event, either as
/// the bare `{"value": {...}}` payload or wrapped in a CloudEvent `data`
/// field, and runs the fan-out for the created admin notification.
///
/// Status codes: 200 = done, 500 = store failure, 400 = malformed event or a
/// document outside the source collection. Eventarc redelivers on any non-2xx
/// response, so a 400 is retried like a 500 until the subscription's retry
/// policy gives up.
use actix_web::{web, HttpResponse};
use firestore_rest::Document;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::FanoutError;
use crate::models::AdminNotification;
use crate::services::NotificationFanoutHandler;

/// Firestore event payload; only the created document is used
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreEvent {
    pub value: Document,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TriggerEnvelope {
    CloudEvent { data: FirestoreEvent },
    Direct(FirestoreEvent),
}

impl TriggerEnvelope {
    pub fn into_document(self) -> Document {
        match self {
            TriggerEnvelope::CloudEvent { data } => data.value,
            TriggerEnvelope::Direct(event) => event.value,
        }
    }
}

/// POST /
pub async fn on_document_created(
    handler: web::Data<Arc<NotificationFanoutHandler>>,
    envelope: web::Json<TriggerEnvelope>,
) -> Result<HttpResponse, FanoutError> {
    let document = envelope.into_inner().into_document();
    debug!(document = %document.name, "Received document-created event");

    let notification =
        AdminNotification::from_document(&document, &handler.options().source_collection)?;
    let report = handler.handle(&notification).await?;

    Ok(HttpResponse::Ok().json(report))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::post().to(on_document_created));
}
