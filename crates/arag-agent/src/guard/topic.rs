//! Topic guardrail

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use arag_core::{ChatModel, GenerationConfig, Result};

use crate::prompts;

/// Whether a query belongs to the marketing domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicVerdict {
    OnTopic,
    OffTopic,
}

impl TopicVerdict {
    /// Fail-closed reading of the classifier output: only a trimmed,
    /// lowercased `"true"` is on topic.
    pub fn from_response(response: &str) -> Self {
        if response.trim().to_lowercase() == "true" {
            TopicVerdict::OnTopic
        } else {
            TopicVerdict::OffTopic
        }
    }

    pub fn is_on_topic(&self) -> bool {
        *self == TopicVerdict::OnTopic
    }
}

/// Classifies queries with a single LLM call
pub struct TopicGuard<M: ChatModel> {
    model: Arc<M>,
    config: GenerationConfig,
    message: String,
}

impl<M: ChatModel> TopicGuard<M> {
    pub fn new(model: Arc<M>) -> Self {
        let config = GenerationConfig::deterministic(model.model_id()).with_max_tokens(8);
        Self {
            model,
            config,
            message: prompts::OFF_TOPIC_MESSAGE.to_string(),
        }
    }

    /// Deadline handed to the model with every call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Message returned to the user on rejection
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Errors from the model are propagated, never read as a verdict.
    pub async fn classify(&self, query: &str) -> Result<TopicVerdict> {
        let response = self
            .model
            .complete(&prompts::topic_prompt(query), &self.config)
            .await?;
        let verdict = TopicVerdict::from_response(&response.text);
        tracing::debug!(?verdict, raw = %response.text.trim(), "Topic classification");
        Ok(verdict)
    }
}
