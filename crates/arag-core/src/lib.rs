//! Core traits and types for ARAG, the marketing content assistant
//!
//! This crate defines the capability-facing interfaces used across the
//! workspace: chat-completion models, embedders and vector indexes, plus the
//! request/response types of the retrieval pipeline. Everything external is
//! reached through these traits, which keeps the pipeline test-friendly.

pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod types;
pub mod vector_index;


pub use config::{IndexSettings, IngestionSettings, RetrievalSettings, Settings};
pub use embedding::Embedder;
pub use error::{Error, Result, with_timeout};
pub use llm::{ChatModel, GenerationConfig, GenerationResult};
pub use types::*;
pub use vector_index::{IndexEntry, IndexSpec, Metric, SearchConfig, VectorIndex};
