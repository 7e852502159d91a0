//! Ingestion: load, split and upsert the markdown corpus

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};

use arag_core::{Document, Embedder, IngestionSettings, Result, VectorIndex};

use crate::{DocumentStore, MarkdownLoader, TextSplitter};

/// Number of batches embedded and written concurrently
const CONCURRENT_BATCHES: usize = 4;

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingResult {
    pub documents_loaded: usize,
    pub chunks_indexed: usize,
}

pub struct DocumentIndexer<E: Embedder, I: VectorIndex> {
    store: Arc<DocumentStore<E, I>>,
    splitter: TextSplitter,
    batch_size: usize,
}

impl<E: Embedder, I: VectorIndex> DocumentIndexer<E, I> {
    pub fn new(store: Arc<DocumentStore<E, I>>) -> Self {
        Self::with_settings(store, &IngestionSettings::default())
    }

    pub fn with_settings(store: Arc<DocumentStore<E, I>>, settings: &IngestionSettings) -> Self {
        Self {
            store,
            splitter: TextSplitter::new(settings.chunk_size, settings.chunk_overlap),
            batch_size: settings.batch_size.max(1),
        }
    }

    /// Split `documents` into chunks and upsert them
    pub async fn index_documents(&self, documents: &[Document]) -> Result<IndexingResult> {
        let chunks = self.splitter.split_documents(documents);
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Split documents into chunks"
        );

        let written: Vec<usize> = stream::iter(chunks.chunks(self.batch_size))
            .map(|batch| async move {
                self.store.add_documents(batch).await?;
                tracing::debug!(batch = batch.len(), "Indexed batch");
                Ok::<_, arag_core::Error>(batch.len())
            })
            .buffered(CONCURRENT_BATCHES)
            .try_collect()
            .await?;

        Ok(IndexingResult {
            documents_loaded: documents.len(),
            chunks_indexed: written.into_iter().sum(),
        })
    }

    /// Load the corpus (optionally one campaign) and index it
    pub async fn index_directory(
        &self,
        loader: &MarkdownLoader,
        campaign: Option<&str>,
    ) -> Result<IndexingResult> {
        let documents = loader.load(campaign)?;
        if documents.is_empty() {
            tracing::warn!(dir = %loader.data_dir().display(), "No documents found");
            return Ok(IndexingResult::default());
        }

        self.store.create_index_if_absent().await?;
        let result = self.index_documents(&documents).await?;
        tracing::info!(
            documents = result.documents_loaded,
            chunks = result.chunks_indexed,
            "Indexing complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashEmbedder, LocalVectorIndex};
    use std::fs;
    use tempfile::TempDir;

    fn indexer() -> DocumentIndexer<HashEmbedder, LocalVectorIndex> {
        let store = DocumentStore::new(
            Arc::new(HashEmbedder::default()),
            Arc::new(LocalVectorIndex::new("marketing")),
        );
        let settings = IngestionSettings {
            chunk_size: 60,
            chunk_overlap: 10,
            batch_size: 2,
            ..IngestionSettings::default()
        };
        DocumentIndexer::with_settings(Arc::new(store), &settings)
    }

    #[tokio::test]
    async fn test_index_directory_counts_chunks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("crm")).unwrap();
        fs::write(
            dir.path().join("crm/countdown.md"),
            "Faltam três dias para a live do curso de Python.\n\n\
             Garanta sua vaga e ative o lembrete no YouTube.\n\n\
             A live começa às 20h com a equipe de professores.",
        )
        .unwrap();
        fs::write(dir.path().join("index.md"), "- [Countdown](crm/countdown.md)").unwrap();

        let indexer = indexer();
        let result = indexer
            .index_directory(&MarkdownLoader::new(dir.path()), None)
            .await
            .unwrap();

        assert_eq!(result.documents_loaded, 1);
        assert_eq!(result.chunks_indexed, 3);
        assert_eq!(indexer.store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = indexer()
            .index_directory(&MarkdownLoader::new(dir.path()), None)
            .await
            .unwrap();
        assert_eq!(result, IndexingResult::default());
    }

    #[tokio::test]
    async fn test_reindexing_does_not_duplicate() {
        let indexer = indexer();
        let docs = vec![Document::new("Post curto para Instagram sobre a semana do consumidor")];

        indexer.index_documents(&docs).await.unwrap();
        indexer.index_documents(&docs).await.unwrap();

        assert_eq!(indexer.store.count().await.unwrap(), 1);
    }
}
