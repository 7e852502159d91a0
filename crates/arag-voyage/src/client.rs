//! Voyage AI embeddings client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use arag_core::{Embedder, Error, Result, with_timeout};

use crate::config::VoyageConfig;

/// Whether the text is a search query or a document being indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Query,
    Document,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub input: &'a [String],
    pub model: &'a str,
    pub input_type: InputType,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Voyage AI embedder
pub struct VoyageEmbedder {
    config: VoyageConfig,
    client: Client,
}

impl VoyageEmbedder {
    /// Create a new Voyage embedder from configuration
    pub fn new(config: VoyageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Order vectors by their `index` and check their dimension
    pub(crate) fn parse_response(body: &str, expected: usize, dimension: usize) -> Result<Vec<Vec<f32>>> {
        let mut response: EmbeddingResponse = serde_json::from_str(body)
            .map_err(|e| Error::Embedding(format!("Invalid Voyage response: {}", e)))?;

        if response.data.len() != expected {
            return Err(Error::Embedding(format!(
                "Voyage returned {} embeddings for {} inputs",
                response.data.len(),
                expected
            )));
        }

        response.data.sort_by_key(|d| d.index);

        response
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == dimension {
                    Ok(d.embedding)
                } else {
                    Err(Error::Embedding(format!(
                        "Expected {}-dimensional embedding, got {}",
                        dimension,
                        d.embedding.len()
                    )))
                }
            })
            .collect()
    }

    async fn request_embeddings(&self, input: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbeddingRequest {
            input,
            model: &self.config.model,
            input_type,
        };

        let response = self
            .client
            .post(self.config.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Embedding(format!("Voyage request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
                    "Voyage rejected the API key ({}): {}",
                    status, error_text
                )),
                _ => Error::Embedding(format!(
                    "Voyage API request failed with status {}: {}",
                    status, error_text
                )),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        Self::parse_response(&body, input.len(), self.config.dimension)
    }
}

#[async_trait]
impl Embedder for VoyageEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let vectors = with_timeout(
            self.config.timeout,
            "Voyage query embedding",
            self.request_embeddings(&input, InputType::Query),
        )
        .await?;

        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Voyage returned no embedding".to_string()))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            let embedded = with_timeout(
                self.config.timeout,
                "Voyage document embedding",
                self.request_embeddings(batch, InputType::Document),
            )
            .await?;
            vectors.extend(embedded);
        }
        tracing::debug!(count = vectors.len(), model = %self.config.model, "embedded documents");
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
