//! Guardrails that can short-circuit the pipeline before generation

mod relevance;
mod topic;

pub use relevance::{RelevanceGuard, contextual_query};
pub use topic::{TopicGuard, TopicVerdict};
