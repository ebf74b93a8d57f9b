use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AuthError;
use crate::models::{GoogleTokenResponse, TokenCache};
use crate::AccessTokenProvider;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Token source for workloads running on Google infrastructure
///
/// Uses the default service account attached to the instance.
pub struct MetadataTokenProvider {
    token_url: String,
    token_cache: Mutex<Option<TokenCache>>,
    http_client: reqwest::Client,
}

impl MetadataTokenProvider {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self::with_url(http_client, METADATA_TOKEN_URL)
    }

    pub fn with_url(http_client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            token_cache: Mutex::new(None),
            http_client,
        }
    }
}

#[async_trait]
impl AccessTokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.token_cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now().timestamp()) {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .http_client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::TokenRequestFailed(response.status().to_string()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenParseError(e.to_string()))?;

        debug!(expires_in = token_response.expires_in, "Fetched metadata server token");

        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }
}
