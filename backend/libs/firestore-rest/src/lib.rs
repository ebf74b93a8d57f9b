//! Minimal Firestore REST client
//!
//! Covers what a fan-out writer needs from Firestore:
//! - atomic `documents:commit` of up to 500 writes
//! - merge (masked) upserts with server timestamp transforms
//! - id-only listing of a collection through `documents:runQuery`
//! - the typed `Value` encoding shared with Firestore event payloads

pub mod client;
pub mod error;
pub mod models;

pub use client::FirestoreClient;
pub use error::{StoreError, StoreResult};
pub use models::{
    document_id, ids_from_run_query, CommitResponse, Document, DocumentMask, FieldTransform, Fields, LatLng,
    RunQueryResponse, Value, Write,
};

/// Maximum number of writes Firestore accepts in a single commit.
pub const MAX_WRITES_PER_COMMIT: usize = 500;
