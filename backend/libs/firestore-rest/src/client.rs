use gcp_oauth::AccessTokenProvider;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::MAX_WRITES_PER_COMMIT;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Firestore REST client
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections and the token provider caches bearer tokens.
pub struct FirestoreClient {
    project_id: String,
    database_id: String,
    base_url: String,
    token_provider: Arc<dyn AccessTokenProvider>,
    http_client: reqwest::Client,
}

impl FirestoreClient {
    pub fn new(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        token_provider: Arc<dyn AccessTokenProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            token_provider,
            http_client,
        }
    }

    /// Point the client at a different host, e.g. the Firestore emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `projects/{project}/databases/{database}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// Full resource name for a slash-separated document path.
    pub fn document_name(&self, path: &str) -> String {
        format!("{}/{}", self.documents_root(), path.trim_matches('/'))
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/{}:{}",
            self.base_url.trim_end_matches('/'),
            self.documents_root(),
            method
        )
    }

    /// Atomically apply `writes`.
    ///
    /// Either every write lands or none does. At most
    /// [`MAX_WRITES_PER_COMMIT`] writes are accepted per call.
    pub async fn commit(&self, writes: &[Write]) -> StoreResult<CommitResponse> {
        if writes.len() > MAX_WRITES_PER_COMMIT {
            return Err(StoreError::BatchTooLarge {
                size: writes.len(),
                max: MAX_WRITES_PER_COMMIT,
            });
        }

        let body = CommitRequest { writes };
        let response = self.post(&self.endpoint("commit"), &body).await?;
        let commit: CommitResponse = response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParse(e.to_string()))?;

        debug!(
            writes = writes.len(),
            commit_time = ?commit.commit_time,
            "Firestore commit applied"
        );
        Ok(commit)
    }

    /// Ids of every document in a top-level collection.
    ///
    /// Only document names are projected, no field data is read.
    pub async fn list_document_ids(&self, collection_id: &str) -> StoreResult<Vec<String>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "select": { "fields": [{ "fieldPath": "__name__" }] }
            }
        });

        let response = self.post(&self.endpoint("runQuery"), &body).await?;
        let responses: Vec<RunQueryResponse> = response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParse(e.to_string()))?;

        let ids = ids_from_run_query(&responses);
        debug!(collection = collection_id, count = ids.len(), "Listed document ids");
        Ok(ids)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> StoreResult<reqwest::Response> {
        let access_token = self.token_provider.access_token().await?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
