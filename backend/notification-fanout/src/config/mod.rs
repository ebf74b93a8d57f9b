use campus_fcm_shared::FCMClient;
use serde::Deserialize;
use thiserror::Error;

use crate::models::ReadFlagPolicy;
use crate::services::{FanoutOptions, MAX_BATCH_WRITES};

/// Prefix shared by every environment variable this service reads.
pub const ENV_PREFIX: &str = "FANOUT_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Service configuration, read from `FANOUT_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_format: LogFormat,

    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Service account key file; the metadata server is used when unset.
    #[serde(default)]
    pub credentials_path: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_source_collection")]
    pub source_collection: String,
    #[serde(default = "default_feed_collection")]
    pub feed_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    #[serde(default = "default_inbox_collection")]
    pub inbox_collection: String,
    #[serde(default = "default_inbox_subcollection")]
    pub inbox_subcollection: String,

    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_max_batch_writes")]
    pub max_batch_writes: usize,
    #[serde(default)]
    pub read_flag: ReadFlagPolicy,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_source_collection() -> String {
    "admin_notifications".to_string()
}

fn default_feed_collection() -> String {
    "notifications".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_inbox_collection() -> String {
    "userNotifications".to_string()
}

fn default_inbox_subcollection() -> String {
    "items".to_string()
}

fn default_topic() -> String {
    "all".to_string()
}

fn default_max_batch_writes() -> usize {
    MAX_BATCH_WRITES
}

impl Config {
    /// Load from the process environment, after applying any `.env` file.
    ///
    /// A bare `PORT` (set by Cloud Run) overrides `FANOUT_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config: Config = envy::prefixed(ENV_PREFIX).from_env()?;
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {}", port)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from explicit key/value pairs (keys carry the `FANOUT_` prefix).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("project_id must not be empty".to_string()));
        }
        // Batches may be made smaller, never larger than the 400-write ceiling.
        if self.max_batch_writes == 0 || self.max_batch_writes > MAX_BATCH_WRITES {
            return Err(ConfigError::Invalid(format!(
                "max_batch_writes must be between 1 and {}, got {}",
                MAX_BATCH_WRITES, self.max_batch_writes
            )));
        }
        if !FCMClient::is_valid_topic(&self.topic) {
            return Err(ConfigError::Invalid(format!("invalid topic name: {}", self.topic)));
        }
        for (name, value) in [
            ("source_collection", &self.source_collection),
            ("feed_collection", &self.feed_collection),
            ("users_collection", &self.users_collection),
            ("inbox_collection", &self.inbox_collection),
            ("inbox_subcollection", &self.inbox_subcollection),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a single collection id, got {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn fanout_options(&self) -> FanoutOptions {
        FanoutOptions {
            source_collection: self.source_collection.clone(),
            feed_collection: self.feed_collection.clone(),
            users_collection: self.users_collection.clone(),
            inbox_collection: self.inbox_collection.clone(),
            inbox_subcollection: self.inbox_subcollection.clone(),
            topic: self.topic.clone(),
            max_batch_writes: self.max_batch_writes,
            read_flag: self.read_flag,
        }
    }
}
