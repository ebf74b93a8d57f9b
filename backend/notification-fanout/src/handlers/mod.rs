pub mod trigger;

use actix_web::web;

pub use trigger::{on_document_created, FirestoreEvent, TriggerEnvelope};

/// Register every route the service exposes besides health and metrics.
pub fn configure(cfg: &mut web::ServiceConfig) {
    trigger::register_routes(cfg);
}
