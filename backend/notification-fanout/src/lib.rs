pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{FanoutError, PushFailure, Result};
pub use models::{AdminNotification, FanoutReport, NotificationPayload, PushOutcome, ReadFlagPolicy};
pub use services::{
    DocumentStore, DocumentWrite, FanoutOptions, FcmPushBroadcaster, FirestoreDocumentStore,
    NotificationFanoutHandler, PushBroadcaster,
};
