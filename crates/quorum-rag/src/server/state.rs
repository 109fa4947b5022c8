//! Application state for the RAG server

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::GenerationEngine;
use crate::ingestion::IngestPipeline;
use crate::providers::{EmbeddingProvider, GenerationProvider, VectorIndexProvider};
use crate::retrieval::RetrievalEngine;
use crate::types::DocumentSummary;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// Vector index provider
    index: Arc<dyn VectorIndexProvider>,
    /// Generation provider
    generator: Arc<dyn GenerationProvider>,
    /// Document registry
    documents: DashMap<Uuid, DocumentSummary>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Validates the configuration up front; a bad deployment config is
    /// fatal here, not per-request.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "RAG state initialized (embeddings: {}/{}d, index: {}, generation: {})",
            embedder.name(),
            embedder.dimensions(),
            index.name(),
            generator.model()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                embedder,
                index,
                generator,
                documents: DashMap::new(),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get vector index provider
    pub fn index(&self) -> &Arc<dyn VectorIndexProvider> {
        &self.inner.index
    }

    /// Get generation provider
    pub fn generator(&self) -> &Arc<dyn GenerationProvider> {
        &self.inner.generator
    }

    /// Build an ingestion pipeline over this state's providers
    pub fn ingest_pipeline(&self) -> Result<IngestPipeline> {
        IngestPipeline::new(
            &self.inner.config,
            Arc::clone(&self.inner.embedder),
            Arc::clone(&self.inner.index),
        )
    }

    /// Build a retrieval engine over this state's providers
    pub fn retrieval_engine(&self) -> RetrievalEngine {
        RetrievalEngine::new(
            &self.inner.config,
            Arc::clone(&self.inner.embedder),
            Arc::clone(&self.inner.index),
        )
    }

    /// Build a generation engine over this state's provider
    pub fn generation_engine(&self) -> GenerationEngine {
        GenerationEngine::new(&self.inner.config, Arc::clone(&self.inner.generator))
    }

    /// Record a document in the registry
    pub fn add_document(&self, doc: DocumentSummary) {
        self.inner.documents.insert(doc.id, doc);
    }

    /// Get a document by id
    pub fn get_document(&self, id: &Uuid) -> Option<DocumentSummary> {
        self.inner.documents.get(id).map(|d| d.clone())
    }

    /// Remove a document from the registry
    pub fn remove_document(&self, id: &Uuid) -> Option<DocumentSummary> {
        self.inner.documents.remove(id).map(|(_, d)| d)
    }

    /// List all documents
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
