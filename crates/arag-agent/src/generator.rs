//! Answer generation over retrieved documents

use std::sync::Arc;
use std::time::Duration;

use arag_core::{ChatModel, Document, GenerationConfig, Result};

use crate::prompts;

pub struct AnswerGenerator<M: ChatModel> {
    model: Arc<M>,
    config: GenerationConfig,
}

impl<M: ChatModel> AnswerGenerator<M> {
    /// Generation runs at temperature 0
    pub fn new(model: Arc<M>) -> Self {
        let config = GenerationConfig::deterministic(model.model_id());
        Self { model, config }
    }

    /// Deadline handed to the model with every call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    pub async fn generate(&self, query: &str, documents: &[Document]) -> Result<String> {
        let prompt = prompts::answer_prompt(documents, query);
        let response = self.model.complete(&prompt, &self.config).await?;
        tracing::debug!(
            context_documents = documents.len(),
            tokens = ?response.tokens_used,
            "Generated answer"
        );
        Ok(response.text)
    }
}
