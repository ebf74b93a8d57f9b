use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AuthError;
use crate::models::*;
use crate::{AccessTokenProvider, CLOUD_PLATFORM_SCOPE};

/// Token source backed by a service account key
///
/// Signs an RS256 assertion with the account's private key and exchanges it
/// at the key's `token_uri`. Tokens are cached until a minute before expiry.
pub struct ServiceAccountTokenProvider {
    credentials: Arc<ServiceAccountKey>,
    token_cache: Mutex<Option<TokenCache>>,
    http_client: reqwest::Client,
}

impl ServiceAccountTokenProvider {
    pub fn new(credentials: ServiceAccountKey, http_client: reqwest::Client) -> Self {
        Self {
            credentials: Arc::new(credentials),
            token_cache: Mutex::new(None),
            http_client,
        }
    }

    fn signed_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::KeyParseError(e.to_string()))?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.credentials.private_key_id.clone());

        encode(&header, &claims, &encoding_key).map_err(|e| AuthError::JwtEncodeError(e.to_string()))
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.token_cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now().timestamp()) {
                return Ok(cached.access_token.clone());
            }
        }

        let assertion = self.signed_assertion()?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
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

        debug!(
            client_email = %self.credentials.client_email,
            expires_in = token_response.expires_in,
            "Issued service account access token"
        );

        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> ServiceAccountKey {
        ServiceAccountKey {
            project_id: "campus-nav".to_string(),
            private_key_id: "key-id".to_string(),
            private_key: "private-key".to_string(),
            client_email: "fanout@campus-nav.iam.gserviceaccount.com".to_string(),
            client_id: "123456".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invalid_private_key_fails_before_network() {
        let provider = ServiceAccountTokenProvider::new(test_key(), reqwest::Client::new());

        let result = provider.access_token().await;
        assert!(matches!(result, Err(AuthError::KeyParseError(_))));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let provider = ServiceAccountTokenProvider::new(test_key(), reqwest::Client::new());
        *provider.token_cache.lock().await = Some(TokenCache {
            access_token: "cached-token".to_string(),
            expires_at: Utc::now().timestamp() + 3600,
        });

        // A fresh cache entry short-circuits signing, so the bad key never matters.
        let token = provider.access_token().await.unwrap();
        assert_eq!(token, "cached-token");
    }
}
