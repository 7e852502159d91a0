//! Retrieval-based relevance guardrail

use std::sync::Arc;

use arag_core::{ChatTurn, Embedder, GuardDecision, Result, RetrievalSettings, VectorIndex};
use arag_rag::DocumentStore;

/// Number of previous user turns folded into the guard's search query
const HISTORY_WINDOW: usize = 3;

/// Characters of content shown next to each diagnostic score
const PREVIEW_CHARS: usize = 50;

/// The last few user turns, newline-joined, followed by `query`.
/// Without history the query is used as is.
pub fn contextual_query(query: &str, history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return query.to_string();
    }

    let recent: Vec<&str> = history
        .iter()
        .filter(|turn| turn.is_human())
        .map(|turn| turn.content.as_str())
        .collect();
    let start = recent.len().saturating_sub(HISTORY_WINDOW);

    let mut lines = recent[start..].to_vec();
    lines.push(query);
    lines.join("\n")
}

/// Lets a query through only when the index holds enough material for it
///
/// Follow-up messages in an ongoing conversation are always let through,
/// even when nothing is retrieved.
pub struct RelevanceGuard<E: Embedder, I: VectorIndex> {
    store: Arc<DocumentStore<E, I>>,
    settings: RetrievalSettings,
}

impl<E: Embedder, I: VectorIndex> RelevanceGuard<E, I> {
    pub fn new(store: Arc<DocumentStore<E, I>>, settings: RetrievalSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub async fn check_relevance(&self, query: &str, history: &[ChatTurn]) -> Result<GuardDecision> {
        let k = self.settings.min_relevant_docs;
        if self.settings.diagnostic_k == 0 && k == 0 {
            return Ok(GuardDecision::pass(Vec::new()));
        }

        let vector = self.store.embed_query(&contextual_query(query, history)).await?;
        let index = self.store.index();

        if self.settings.diagnostic_k > 0 {
            let diagnostic = index.search(&vector, self.settings.diagnostic_k).await?;
            for scored in &diagnostic {
                let preview: String = scored.document.page_content.chars().take(PREVIEW_CHARS).collect();
                tracing::debug!(score = scored.score, content = %preview, "Retrieved document score");
            }
        }

        if k == 0 {
            return Ok(GuardDecision::pass(Vec::new()));
        }

        let found = match self.settings.similarity_threshold {
            Some(threshold) => index.search_with_threshold(&vector, k, threshold).await?,
            None => index.search(&vector, k).await?,
        };
        let documents: Vec<_> = found.into_iter().map(|scored| scored.document).collect();

        if documents.len() >= k || !history.is_empty() {
            tracing::debug!(found = documents.len(), required = k, "Relevance check passed");
            Ok(GuardDecision::pass(documents))
        } else {
            tracing::info!(found = documents.len(), required = k, "No relevant documents");
            Ok(GuardDecision::reject(self.settings.no_docs_message.clone()))
        }
    }
}
