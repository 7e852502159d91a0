//! Voyage AI integration for the ARAG marketing assistant
//!
//! This crate provides the Voyage implementation of the Embedder trait.

mod client;
mod config;

pub use client::{InputType, VoyageEmbedder};
pub use config::VoyageConfig;

// Re-export core types for convenience
pub use arag_core::{Embedder, Error, Result};
