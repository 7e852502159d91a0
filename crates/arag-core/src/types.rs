//! Common types used across the ARAG assistant

use serde::{Deserialize, Serialize};

/// Free-form document metadata (source path, category, title...)
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prior message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }

    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
}

/// A piece of indexed text together with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(page_content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// Path of the file the text came from, when known
    pub fn source_path(&self) -> Option<&str> {
        self.metadata.get("file_path").and_then(|v| v.as_str())
    }
}

/// Retrieved document with its similarity score (cosine, higher is closer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Outcome of the relevance guardrail
///
/// Constructed only through [`GuardDecision::pass`] and
/// [`GuardDecision::reject`], so a rejection never carries documents and
/// always carries a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardDecision {
    pub relevant: bool,
    pub documents: Vec<Document>,
    pub message: Option<String>,
}

impl GuardDecision {
    pub fn pass(documents: Vec<Document>) -> Self {
        Self {
            relevant: true,
            documents,
            message: None,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            relevant: false,
            documents: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    OffTopic,
    NoRelevantDocuments,
}

/// Final answer handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub query: String,
    pub result: String,
    pub source_documents: Vec<Document>,
    pub outcome: Outcome,
}

impl AgentResponse {
    pub fn answered(query: impl Into<String>, result: String, source_documents: Vec<Document>) -> Self {
        Self {
            query: query.into(),
            result,
            source_documents,
            outcome: Outcome::Answered,
        }
    }

    /// A guard rejection: canned message, no sources
    pub fn rejected(query: impl Into<String>, message: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            query: query.into(),
            result: message.into(),
            source_documents: Vec::new(),
            outcome,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.outcome != Outcome::Answered
    }
}
