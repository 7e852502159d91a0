//! History-aware query rephrasing

use std::sync::Arc;
use std::time::Duration;

use arag_core::{ChatModel, ChatTurn, GenerationConfig, Result};

use crate::prompts;

/// Rewrites the latest request into a standalone retrieval query
pub struct HistoryRephraser<M: ChatModel> {
    model: Arc<M>,
    config: GenerationConfig,
}

impl<M: ChatModel> HistoryRephraser<M> {
    pub fn new(model: Arc<M>) -> Self {
        let config = GenerationConfig::deterministic(model.model_id()).with_max_tokens(256);
        Self { model, config }
    }

    /// Deadline handed to the model with every call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Always calls the model, even without history. The raw model text is
    /// returned untouched.
    pub async fn rephrase(&self, query: &str, history: &[ChatTurn]) -> Result<String> {
        let prompt = prompts::rephrase_prompt(history, query);
        let response = self.model.complete(&prompt, &self.config).await?;
        tracing::debug!(original = %query, rephrased = %response.text, "Rephrased query");
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedModel;

    #[tokio::test]
    async fn test_history_is_sent_in_order() {
        let model = Arc::new(ScriptedModel::new(["Crie uma versão curta do post de Black Friday"]));
        let rephraser = HistoryRephraser::new(model.clone());
        let history = vec![
            ChatTurn::human("Crie um post de Black Friday"),
            ChatTurn::ai("Post: ofertas imperdíveis..."),
        ];

        let rephrased = rephraser.rephrase("agora mais curto", &history).await.unwrap();

        assert_eq!(rephrased, "Crie uma versão curta do post de Black Friday");
        let prompt = &model.prompts()[0];
        let first = prompt.find("human: Crie um post de Black Friday").unwrap();
        let second = prompt.find("ai: Post: ofertas imperdíveis...").unwrap();
        assert!(first < second);
        assert!(prompt.contains("agora mais curto"));
    }

    #[tokio::test]
    async fn test_called_without_history() {
        let model = Arc::new(ScriptedModel::new(["  Roteiro de live  "]));
        let rephrased = HistoryRephraser::new(model.clone())
            .rephrase("Roteiro de live", &[])
            .await
            .unwrap();

        assert_eq!(model.prompts().len(), 1);
        assert_eq!(rephrased, "  Roteiro de live  ");
    }
}
