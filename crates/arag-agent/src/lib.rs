//! Guarded RAG pipeline for the ARAG marketing assistant
//!
//! A request goes through the topic guard, history-aware rephrasing,
//! retrieval, the relevance guard and finally answer generation.

pub mod guard;
mod generator;
pub mod prompts;
mod pipeline;
mod rephraser;

#[cfg(test)]
mod mock;

pub use generator::AnswerGenerator;
pub use guard::{RelevanceGuard, TopicGuard, TopicVerdict, contextual_query};
pub use pipeline::RagPipeline;
pub use rephraser::HistoryRephraser;

// Re-export core types for convenience
pub use arag_core::{AgentResponse, ChatTurn, Error, GuardDecision, Outcome, Result};
