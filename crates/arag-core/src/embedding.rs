//! Embedding service trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding services
///
/// Vectors have a fixed dimension per configured model and must be
/// deterministic for a given model version. Failures surface as
/// [`crate::Error::Embedding`] and are never retried here.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a search query
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents for indexing
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Dimension of every vector this embedder produces
    fn dimension(&self) -> usize;
}
