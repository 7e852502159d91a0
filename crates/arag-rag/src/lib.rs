//! Retrieval layer for the ARAG marketing assistant
//!
//! Vector indexes (in-memory and Qdrant), the offline hash embedder, the
//! text-level `DocumentStore`, and corpus ingestion.

mod document_store;
mod embedder;
mod indexer;
mod loader;
mod splitter;
mod vector_store;


pub use document_store::DocumentStore;
pub use embedder::HashEmbedder;
pub use indexer::{DocumentIndexer, IndexingResult};
pub use loader::{MarkdownLoader, parse_front_matter};
pub use splitter::TextSplitter;
pub use vector_store::{LocalVectorIndex, QdrantVectorIndex};

// Re-export core types for convenience
pub use arag_core::{
    Document, Embedder, Error, IndexSpec, Metadata, Result, ScoredDocument, SearchConfig, VectorIndex,
};
