/// Document store port used by the fan-out
///
/// The handler only needs three operations: merge-upsert one document,
/// list the ids of a collection, and atomically commit a batch of
/// merge-writes. `FirestoreDocumentStore` maps them onto the Firestore REST
/// API; tests substitute an in-memory implementation.
use async_trait::async_trait;
use firestore_rest::{Fields, FirestoreClient, StoreResult, Write};
use std::sync::Arc;

/// Merge-write of `fields` into the document at `path`
///
/// `path` is relative to the database root, e.g.
/// `userNotifications/{uid}/items/{id}`. Fields listed in
/// `server_timestamps` are set to the commit time by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub path: String,
    pub fields: Fields,
    pub server_timestamps: Vec<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Merge-upsert a single document.
    async fn merge_document(&self, write: DocumentWrite) -> StoreResult<()>;

    /// Ids of every document in a top-level collection, without field data.
    async fn list_ids(&self, collection: &str) -> StoreResult<Vec<String>>;

    /// Apply all writes atomically.
    async fn commit_batch(&self, writes: Vec<DocumentWrite>) -> StoreResult<()>;
}

/// `DocumentStore` backed by Firestore
pub struct FirestoreDocumentStore {
    client: Arc<FirestoreClient>,
}

impl FirestoreDocumentStore {
    pub fn new(client: Arc<FirestoreClient>) -> Self {
        Self { client }
    }

    fn to_write(&self, write: DocumentWrite) -> Write {
        let server_timestamps: Vec<&str> =
            write.server_timestamps.iter().map(String::as_str).collect();
        Write::merge(
            self.client.document_name(&write.path),
            write.fields,
            &server_timestamps,
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn merge_document(&self, write: DocumentWrite) -> StoreResult<()> {
        self.commit_batch(vec![write]).await
    }

    async fn list_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.client.list_document_ids(collection).await
    }

    async fn commit_batch(&self, writes: Vec<DocumentWrite>) -> StoreResult<()> {
        let writes: Vec<Write> = writes.into_iter().map(|w| self.to_write(w)).collect();
        self.client.commit(&writes).await?;
        Ok(())
    }
}
