//! Groq integration for the ARAG marketing assistant
//!
//! This crate provides the Groq implementation of the ChatModel trait.

mod client;
mod config;


pub use client::GroqClient;
pub use config::GroqConfig;

// Re-export core types for convenience
pub use arag_core::{ChatModel, Error, GenerationConfig, GenerationResult, Result};
