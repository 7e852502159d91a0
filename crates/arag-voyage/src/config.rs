//! Voyage AI configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use arag_core::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.voyageai.com/v1";
pub const DEFAULT_MODEL: &str = "voyage-3";
pub const DEFAULT_DIMENSION: usize = 1024;

/// Configuration for the Voyage embeddings client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub dimension: usize,
    /// Inputs sent per request when embedding documents
    pub batch_size: usize,
    #[serde(skip, default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

impl VoyageConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("VOYAGE_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Configuration(
                "VOYAGE_API_KEY environment variable not found".to_string()
            ))?;

        let api_url = lookup("VOYAGE_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url)
            .map_err(|e| Error::Configuration(format!("VOYAGE_API_URL is not a valid URL: {}", e)))?;

        let model = lookup("VOYAGE_MODEL")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let dimension = match lookup("VOYAGE_DIMENSION") {
            Some(raw) => raw.trim().parse().map_err(|_| Error::Configuration(
                format!("VOYAGE_DIMENSION has an invalid value '{}'", raw)
            ))?,
            None => DEFAULT_DIMENSION,
        };

        Ok(Self {
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            dimension,
            batch_size: 128,
            timeout: default_timeout(),
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            batch_size: 128,
            timeout: default_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.api_url)
    }
}
