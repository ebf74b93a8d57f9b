/// Google OAuth2 access tokens for server-to-server calls
///
/// Shared by the Firestore and FCM adapters. Two token sources are provided:
/// - Service account JSON key (JWT bearer grant), for local runs and CI
/// - Instance metadata server, for Cloud Run and Cloud Functions hosts
///
/// Both cache the issued token and refresh it shortly before expiry.

pub mod error;
pub mod metadata;
pub mod models;
pub mod service_account;

pub use error::AuthError;
pub use metadata::MetadataTokenProvider;
pub use models::{ServiceAccountKey, TokenCache};
pub use service_account::ServiceAccountTokenProvider;

use async_trait::async_trait;

/// Scope covering both Firestore and FCM HTTP v1.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of bearer tokens for Google APIs.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a token valid for at least another minute.
    async fn access_token(&self) -> Result<String, AuthError>;
}
