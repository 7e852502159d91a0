//! Vector index implementations

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use arag_core::{
    Document, Error, IndexEntry, IndexSpec, Metadata, Metric, Result, ScoredDocument, SearchConfig,
    VectorIndex,
};

/// Cosine similarity, 0.0 for mismatched or zero vectors
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

fn sort_by_score(results: &mut [ScoredDocument]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

struct StoredEntry {
    vector: Vec<f32>,
    document: Document,
}

/// In-memory vector index with cosine similarity
///
/// Entries are keyed by id, so upserting an existing id overwrites it.
pub struct LocalVectorIndex {
    name: String,
    dimension: RwLock<Option<usize>>,
    entries: RwLock<BTreeMap<String, StoredEntry>>,
}

impl LocalVectorIndex {
    /// Create a new, already provisioned, in-memory index
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension: RwLock::new(None),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> Error {
        Error::IndexUnavailable(format!("Lock error: {}", e))
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn create_index_if_absent(&self, spec: &IndexSpec) -> Result<bool> {
        if spec.metric != Metric::Cosine {
            return Err(Error::InvalidInput(format!(
                "In-memory index only supports cosine similarity, got {:?}",
                spec.metric
            )));
        }

        let mut dimension = self.dimension.write().map_err(Self::lock_error)?;
        match *dimension {
            Some(_) => Ok(false),
            None => {
                *dimension = Some(spec.dimension);
                Ok(true)
            }
        }
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let expected = *self.dimension.read().map_err(Self::lock_error)?;
        let mut stored = self.entries.write().map_err(Self::lock_error)?;

        for entry in entries {
            if let Some(dimension) = expected {
                if entry.vector.len() != dimension {
                    return Err(Error::InvalidInput(format!(
                        "Vector for '{}' has dimension {}, index '{}' expects {}",
                        entry.id,
                        entry.vector.len(),
                        self.name,
                        dimension
                    )));
                }
            }
            stored.insert(
                entry.id,
                StoredEntry {
                    vector: entry.vector,
                    document: entry.document,
                },
            );
        }

        Ok(())
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredDocument>> {
        let stored = self.entries.read().map_err(Self::lock_error)?;

        let mut results: Vec<ScoredDocument> = stored
            .values()
            .filter(|entry| config.matches(&entry.document.metadata))
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(vector, &entry.vector),
            })
            .filter(|doc| config.score_threshold.map_or(true, |t| doc.score >= t))
            .collect();

        sort_by_score(&mut results);
        results.truncate(config.top_k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let stored = self.entries.read().map_err(Self::lock_error)?;
        Ok(stored.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut stored = self.entries.write().map_err(Self::lock_error)?;
        stored.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

const TEXT_KEY: &str = "text";
const METADATA_KEY: &str = "metadata_json";

/// Qdrant-backed vector index
///
/// Each point's payload carries the chunk text, the exact metadata as JSON,
/// and every scalar metadata field at top level so it can be filtered on.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection_name: String,
}

impl QdrantVectorIndex {
    /// Build a client for `collection_name`; no request is made yet
    pub fn new(url: &str, api_key: Option<String>, collection_name: &str) -> Result<Self> {
        let mut config = Qdrant::from_url(url);
        if let Some(key) = api_key {
            config = config.api_key(key);
        }
        let client = config.build().map_err(index_error)?;

        Ok(Self {
            client,
            collection_name: collection_name.to_string(),
        })
    }

    /// Fail with [`Error::IndexNotFound`] when the collection is missing
    pub async fn ensure_exists(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(index_error)?;
        if exists {
            Ok(())
        } else {
            Err(Error::IndexNotFound(format!(
                "Collection '{}' does not exist; run `arag init-index` first",
                self.collection_name
            )))
        }
    }

    fn to_payload(document: &Document) -> Result<Payload> {
        let mut payload = Payload::new();
        payload.insert(TEXT_KEY, document.page_content.clone());
        payload.insert(METADATA_KEY, serde_json::to_string(&document.metadata)?);

        for (key, value) in &document.metadata {
            if key == TEXT_KEY || key == METADATA_KEY {
                continue;
            }
            match value {
                serde_json::Value::String(s) => payload.insert(key.as_str(), s.clone()),
                serde_json::Value::Bool(b) => payload.insert(key.as_str(), *b),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        payload.insert(key.as_str(), i);
                    } else if let Some(f) = n.as_f64() {
                        payload.insert(key.as_str(), f);
                    }
                }
                _ => {}
            }
        }

        Ok(payload)
    }

    fn from_payload(payload: HashMap<String, Value>) -> Result<Document> {
        let string_field = |key: &str| match payload.get(key) {
            Some(Value { kind: Some(Kind::StringValue(s)) }) => Some(s.clone()),
            _ => None,
        };

        let page_content = string_field(TEXT_KEY).ok_or_else(|| {
            Error::IndexUnavailable(format!("Point without '{}' payload", TEXT_KEY))
        })?;

        let metadata: Metadata = match string_field(METADATA_KEY) {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Metadata::new(),
        };

        Ok(Document::with_metadata(page_content, metadata))
    }

    fn to_filter(filters: &Metadata) -> Result<Filter> {
        let conditions = filters
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => Ok(Condition::matches(key.as_str(), s.clone())),
                serde_json::Value::Bool(b) => Ok(Condition::matches(key.as_str(), *b)),
                serde_json::Value::Number(n) if n.is_i64() => {
                    Ok(Condition::matches(key.as_str(), n.as_i64().unwrap_or_default()))
                }
                other => Err(Error::InvalidInput(format!(
                    "Unsupported filter value for '{}': {}",
                    key, other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Filter::must(conditions))
    }
}

/// gRPC status code qdrant answers with for a missing collection
const GRPC_NOT_FOUND: i32 = 5;

fn index_error(e: QdrantError) -> Error {
    match e {
        QdrantError::ResponseError { status } => status_error(status.code() as i32, status.message()),
        other => Error::IndexUnavailable(other.to_string()),
    }
}

fn status_error(code: i32, message: &str) -> Error {
    if code == GRPC_NOT_FOUND {
        Error::IndexNotFound(message.to_string())
    } else {
        Error::IndexUnavailable(format!("status {}: {}", code, message))
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn create_index_if_absent(&self, spec: &IndexSpec) -> Result<bool> {
        let exists = self
            .client
            .collection_exists(&spec.name)
            .await
            .map_err(index_error)?;
        if exists {
            return Ok(false);
        }

        let distance = match spec.metric {
            Metric::Cosine => Distance::Cosine,
            Metric::Dot => Distance::Dot,
            Metric::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&spec.name)
                    .vectors_config(VectorParamsBuilder::new(spec.dimension as u64, distance)),
            )
            .await
            .map_err(index_error)?;

        tracing::info!(collection = %spec.name, dimension = spec.dimension, "created qdrant collection");
        Ok(true)
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let points = entries
            .into_iter()
            .map(|entry| {
                let payload = Self::to_payload(&entry.document)?;
                Ok(PointStruct::new(entry.id, entry.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .map_err(index_error)?;

        Ok(())
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredDocument>> {
        if config.top_k == 0 {
            return Ok(Vec::new());
        }

        let mut request = SearchPointsBuilder::new(&self.collection_name, vector.to_vec(), config.top_k as u64)
            .with_payload(true);
        if let Some(threshold) = config.score_threshold {
            request = request.score_threshold(threshold);
        }
        if let Some(ref filters) = config.filters {
            request = request.filter(Self::to_filter(filters)?);
        }

        let response = self.client.search_points(request).await.map_err(index_error)?;

        let mut results = response
            .result
            .into_iter()
            .map(|point| {
                Ok(ScoredDocument {
                    score: point.score,
                    document: Self::from_payload(point.payload)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        sort_by_score(&mut results);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(index_error)?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn clear(&self) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name)
                    .points(Filter::default())
                    .wait(true),
            )
            .await
            .map_err(index_error)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.collection_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, vector: Vec<f32>, text: &str, category: &str) -> IndexEntry {
        let mut metadata = Metadata::new();
        metadata.insert("category".into(), json!(category));
        IndexEntry {
            id: id.to_string(),
            vector,
            document: Document::with_metadata(text, metadata),
        }
    }

    async fn seeded_index() -> LocalVectorIndex {
        let index = LocalVectorIndex::new("test");
        index.create_index_if_absent(&IndexSpec::cosine("test", 2)).await.unwrap();
        index
            .upsert(vec![
                entry("a", vec![1.0, 0.0], "email de boas-vindas", "Crm"),
                entry("b", vec![0.8, 0.6], "post para instagram", "Social"),
                entry("c", vec![0.0, 1.0], "roteiro de podcast", "Audio"),
            ])
            .await
            .unwrap();
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_orders_by_descending_score() {
        let index = seeded_index().await;

        let results = index.search(&[1.0, 0.0], 3).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.document.page_content.as_str()).collect();
        assert_eq!(texts, vec!["email de boas-vindas", "post para instagram", "roteiro de podcast"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_search_with_threshold() {
        let index = seeded_index().await;

        let results = index.search_with_threshold(&[1.0, 0.0], 5, 0.7).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score >= 0.7));
    }

    #[tokio::test]
    async fn test_search_with_filters() {
        let index = seeded_index().await;

        let mut filters = Metadata::new();
        filters.insert("category".into(), json!("Audio"));
        let results = index
            .search_by_vector(&[1.0, 0.0], &SearchConfig::top_k(5).with_filters(filters))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.page_content, "roteiro de podcast");
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id() {
        let index = seeded_index().await;
        index
            .upsert(vec![entry("a", vec![1.0, 0.0], "email revisado", "Crm")])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 3);
        let top = index.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(top[0].document.page_content, "email revisado");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = seeded_index().await;
        let err = index
            .upsert(vec![entry("d", vec![1.0, 0.0, 0.0], "x", "Crm")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_index_if_absent_only_once() {
        let index = LocalVectorIndex::new("test");
        assert!(index.create_index_if_absent(&IndexSpec::cosine("test", 4)).await.unwrap());
        assert!(!index.create_index_if_absent(&IndexSpec::cosine("test", 4)).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let index = seeded_index().await;
        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.search(&[1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[test]
    fn test_qdrant_payload_keeps_metadata_exact() {
        let mut metadata = Metadata::new();
        metadata.insert("file_path".into(), json!("crm/live.md"));
        metadata.insert("page".into(), json!(2));
        metadata.insert("tags".into(), json!(["crm", "live"]));
        let document = Document::with_metadata("Contagem regressiva para a live", metadata);

        let payload = QdrantVectorIndex::to_payload(&document).unwrap();
        let map: HashMap<String, Value> = payload.into();
        let restored = QdrantVectorIndex::from_payload(map).unwrap();

        assert_eq!(restored, document);
    }

    #[test]
    fn test_qdrant_filter_rejects_nested_values() {
        let mut filters = Metadata::new();
        filters.insert("tags".into(), json!(["crm"]));
        assert!(QdrantVectorIndex::to_filter(&filters).is_err());

        let mut filters = Metadata::new();
        filters.insert("category".into(), json!("Crm"));
        assert!(QdrantVectorIndex::to_filter(&filters).is_ok());
    }

    #[test]
    fn test_missing_collection_status_is_index_not_found() {
        let err = status_error(GRPC_NOT_FOUND, "Collection `marketing` doesn't exist!");
        match err {
            Error::IndexNotFound(message) => assert!(message.contains("marketing")),
            other => panic!("expected IndexNotFound, got {:?}", other),
        }

        // UNAVAILABLE
        assert!(matches!(status_error(14, "connection refused"), Error::IndexUnavailable(_)));
    }
}
