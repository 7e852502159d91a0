//! Conversation state of an interactive chat

use serde::Serialize;

use arag_core::{AgentResponse, ChatTurn, Document};

/// Turns exchanged so far plus the sources of the latest answer
///
/// Every exchange is recorded, guard rejections included, so the next
/// request sees the whole conversation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
    current_sources: Vec<Document>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// History to pass along with the next request, oldest turn first
    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn current_sources(&self) -> &[Document] {
        &self.current_sources
    }

    pub fn record(&mut self, query: &str, response: &AgentResponse) {
        self.turns.push(ChatTurn::human(query));
        self.turns.push(ChatTurn::ai(response.result.clone()));
        self.current_sources = response.source_documents.clone();
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.current_sources.clear();
    }
}
