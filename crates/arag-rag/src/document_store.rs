//! Text-level access to a vector index

use std::sync::Arc;

use uuid::Uuid;

use arag_core::{
    Document, Embedder, Error, IndexEntry, IndexSpec, Metadata, Result, ScoredDocument, SearchConfig,
    VectorIndex,
};

/// An embedder paired with a vector index
///
/// Callers speak in texts and queries; embedding happens here. Point ids
/// are derived from text and metadata, so upserting the same chunk twice
/// overwrites one point instead of duplicating it.
pub struct DocumentStore<E: Embedder, I: VectorIndex> {
    embedder: Arc<E>,
    index: Arc<I>,
}

impl<E: Embedder, I: VectorIndex> DocumentStore<E, I> {
    pub fn new(embedder: Arc<E>, index: Arc<I>) -> Self {
        Self { embedder, index }
    }

    /// Query embedding, for callers that run several searches over one query
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder.embed(query).await
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Deterministic point id for a chunk
    pub fn point_id(text: &str, metadata: &Metadata) -> String {
        let key = format!(
            "{}\u{0}{}",
            text,
            serde_json::Value::Object(metadata.clone())
        );
        Uuid::from_bytes(md5::compute(key.as_bytes()).0).to_string()
    }

    /// Provision the underlying index with this store's embedding dimension
    pub async fn create_index_if_absent(&self) -> Result<bool> {
        let spec = IndexSpec::cosine(self.index.name(), self.embedder.dimension());
        self.index.create_index_if_absent(&spec).await
    }

    /// Embed and write `texts`; `metadatas` is either empty or one per text
    pub async fn upsert(&self, texts: &[String], metadatas: &[Metadata]) -> Result<Vec<String>> {
        if !metadatas.is_empty() && metadatas.len() != texts.len() {
            return Err(Error::InvalidInput(format!(
                "Got {} texts but {} metadata entries",
                texts.len(),
                metadatas.len()
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.embedder.embed_documents(texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let entries: Vec<IndexEntry> = texts
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, vector))| {
                let metadata = metadatas.get(i).cloned().unwrap_or_default();
                IndexEntry {
                    id: Self::point_id(text, &metadata),
                    vector,
                    document: Document::with_metadata(text.clone(), metadata),
                }
            })
            .collect();

        let ids = entries.iter().map(|e| e.id.clone()).collect();
        self.index.upsert(entries).await?;
        Ok(ids)
    }

    /// Write already-built documents
    pub async fn add_documents(&self, documents: &[Document]) -> Result<Vec<String>> {
        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let metadatas: Vec<Metadata> = documents.iter().map(|d| d.metadata.clone()).collect();
        self.upsert(&texts, &metadatas).await
    }

    pub async fn search(&self, query: &str, config: &SearchConfig) -> Result<Vec<ScoredDocument>> {
        let vector = self.embed_query(query).await?;
        self.index.search_by_vector(&vector, config).await
    }

    pub async fn similarity_search_with_score(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let vector = self.embed_query(query).await?;
        self.index.search(&vector, k).await
    }

    pub async fn similarity_search_with_threshold(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredDocument>> {
        let vector = self.embed_query(query).await?;
        self.index.search_with_threshold(&vector, k, min_score).await
    }

    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let results = self.similarity_search_with_score(query, k).await?;
        Ok(results.into_iter().map(|r| r.document).collect())
    }

    pub async fn count(&self) -> Result<usize> {
        self.index.count().await
    }

    /// Delete every vector of the index
    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await
    }
}
