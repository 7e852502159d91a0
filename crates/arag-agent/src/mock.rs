//! Test doubles for the chat model and the vector index

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use arag_core::{
    ChatModel, Document, Embedder, Error, GenerationConfig, GenerationResult, IndexEntry, IndexSpec, Result,
    ScoredDocument, SearchConfig, VectorIndex,
};
use arag_rag::HashEmbedder;

/// Answers prompts with canned responses, in order, and records every prompt
/// along with the timeout it was sent with. Fails once the script runs out.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.timeouts.lock().unwrap().push(config.timeout);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::LLMProvider("script exhausted".to_string()))?;
        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used: None,
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Hash embedder that counts the queries it embeds
#[derive(Default)]
pub struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

pub fn scored(text: &str, score: f32) -> ScoredDocument {
    ScoredDocument {
        document: Document::new(text),
        score,
    }
}

/// Index whose search results are fixed up front, whatever the query vector.
/// Honours `top_k` and `score_threshold`, and records every search.
pub struct StaticIndex {
    results: Vec<ScoredDocument>,
    requests: Mutex<Vec<SearchConfig>>,
}

impl StaticIndex {
    pub fn new(mut results: Vec<ScoredDocument>) -> Self {
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self {
            results,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SearchConfig> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn create_index_if_absent(&self, _spec: &IndexSpec) -> Result<bool> {
        Ok(false)
    }

    async fn upsert(&self, _entries: Vec<IndexEntry>) -> Result<()> {
        Ok(())
    }

    async fn search_by_vector(&self, _vector: &[f32], config: &SearchConfig) -> Result<Vec<ScoredDocument>> {
        self.requests.lock().unwrap().push(config.clone());
        Ok(self
            .results
            .iter()
            .filter(|r| config.score_threshold.is_none_or(|min| r.score >= min))
            .take(config.top_k)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.results.len())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Index that cannot be reached; every search fails
pub struct UnreachableIndex;

#[async_trait]
impl VectorIndex for UnreachableIndex {
    async fn create_index_if_absent(&self, _spec: &IndexSpec) -> Result<bool> {
        Err(Error::IndexUnavailable("connection refused".to_string()))
    }

    async fn upsert(&self, _entries: Vec<IndexEntry>) -> Result<()> {
        Err(Error::IndexUnavailable("connection refused".to_string()))
    }

    async fn search_by_vector(&self, _vector: &[f32], _config: &SearchConfig) -> Result<Vec<ScoredDocument>> {
        Err(Error::IndexUnavailable("connection refused".to_string()))
    }

    async fn count(&self) -> Result<usize> {
        Err(Error::IndexUnavailable("connection refused".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        Err(Error::IndexUnavailable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}
