//! Process-wide settings
//!
//! Resolved once at startup and handed to each component's constructor.
//! Provider credentials live in the provider crates' own configs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_NO_DOCS_MESSAGE: &str = "Não encontrei materiais de referência relevantes para essa solicitação. \
    Reformule o pedido com mais contexto (tema, campanha, formato) ou faça uma solicitação diferente.";

/// Where the vector index lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSettings {
    pub name: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
}

/// Knobs of the retrieval and relevance guard stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub similarity_threshold: Option<f32>,
    pub min_relevant_docs: usize,
    /// Documents fetched as generation context
    pub retrieval_k: usize,
    /// Documents fetched only to log their scores
    pub diagnostic_k: usize,
    pub no_docs_message: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: None,
            min_relevant_docs: 1,
            retrieval_k: 4,
            diagnostic_k: 5,
            no_docs_message: DEFAULT_NO_DOCS_MESSAGE.to_string(),
        }
    }
}

/// Configuration for document ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSettings {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/processed"),
            chunk_size: 500,
            chunk_overlap: 50,
            batch_size: 32,
        }
    }
}

/// Settings shared by the pipeline and the ingestion job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub ingestion: IngestionSettings,
    pub request_timeout: Duration,
}

impl Settings {
    /// Create settings from environment variables (and `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup("INDEX_NAME")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Configuration("INDEX_NAME environment variable not found".to_string()))?;

        let qdrant_url = lookup("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string());
        url::Url::parse(&qdrant_url)
            .map_err(|e| Error::Configuration(format!("QDRANT_URL is not a valid URL: {}", e)))?;

        let similarity_threshold: Option<f32> = parse_optional(&lookup, "SIMILARITY_THRESHOLD")?;
        if let Some(threshold) = similarity_threshold.filter(|t| !t.is_finite()) {
            return Err(Error::Configuration(format!(
                "SIMILARITY_THRESHOLD must be a finite number, got {}",
                threshold
            )));
        }

        let defaults = RetrievalSettings::default();
        let retrieval = RetrievalSettings {
            similarity_threshold,
            min_relevant_docs: parse_or(&lookup, "MIN_RELEVANT_DOCS", defaults.min_relevant_docs)?,
            retrieval_k: parse_or(&lookup, "RETRIEVAL_K", defaults.retrieval_k)?,
            diagnostic_k: parse_or(&lookup, "DIAGNOSTIC_K", defaults.diagnostic_k)?,
            no_docs_message: lookup("NO_DOCS_MESSAGE").unwrap_or(defaults.no_docs_message),
        };

        let ingest_defaults = IngestionSettings::default();
        let ingestion = IngestionSettings {
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(ingest_defaults.data_dir),
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", ingest_defaults.chunk_size)?,
            chunk_overlap: parse_or(&lookup, "CHUNK_OVERLAP", ingest_defaults.chunk_overlap)?,
            batch_size: parse_or(&lookup, "INDEX_BATCH_SIZE", ingest_defaults.batch_size)?,
        };
        if ingestion.chunk_overlap >= ingestion.chunk_size {
            return Err(Error::Configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                ingestion.chunk_overlap, ingestion.chunk_size
            )));
        }

        let timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 60)?;

        Ok(Self {
            index: IndexSettings {
                name,
                qdrant_url,
                qdrant_api_key: lookup("QDRANT_API_KEY").filter(|v| !v.is_empty()),
            },
            retrieval,
            ingestion,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Settings for a throwaway in-memory setup
    pub fn local(index_name: impl Into<String>) -> Self {
        Self {
            index: IndexSettings {
                name: index_name.into(),
                qdrant_url: "http://localhost:6334".to_string(),
                qdrant_api_key: None,
            },
            retrieval: RetrievalSettings::default(),
            ingestion: IngestionSettings::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

fn parse_optional<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Configuration(format!("{} has an invalid value '{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}
