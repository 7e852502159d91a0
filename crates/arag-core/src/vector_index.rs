//! Vector index trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Document, Metadata, Result, ScoredDocument};

/// Similarity metric of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Dot,
    Euclid,
}

/// Shape of an index, as needed to provision it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl IndexSpec {
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
        }
    }
}

/// A document with its embedding, ready to be written
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub document: Document,
}

/// Configuration for vector search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
    /// Equality filter on metadata fields
    pub filters: Option<Metadata>,
}

impl SearchConfig {
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, min_score: f32) -> Self {
        self.score_threshold = Some(min_score);
        self
    }

    pub fn with_filters(mut self, filters: Metadata) -> Self {
        self.filters = Some(filters);
        self
    }

    /// True when every filter field is present in `metadata` with the same value
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.filters.as_ref().map_or(true, |filters| {
            filters
                .iter()
                .all(|(key, expected)| metadata.get(key) == Some(expected))
        })
    }
}

/// Trait for vector databases (Qdrant, in-memory...)
///
/// Results are always ordered by descending similarity.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index unless it already exists. Returns true when created.
    async fn create_index_if_absent(&self, spec: &IndexSpec) -> Result<bool>;

    /// Insert or overwrite entries by id
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Search using a query embedding
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredDocument>>;

    /// Top `k` entries by similarity
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        self.search_by_vector(vector, &SearchConfig::top_k(k)).await
    }

    /// Top `k` entries whose score is at least `min_score`
    async fn search_with_threshold(
        &self,
        vector: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredDocument>> {
        self.search_by_vector(vector, &SearchConfig::top_k(k).with_threshold(min_score))
            .await
    }

    /// Get the total number of stored entries
    async fn count(&self) -> Result<usize>;

    /// Delete every entry of the index
    async fn clear(&self) -> Result<()>;

    /// Name of the underlying index
    fn name(&self) -> &str;
}
