//! Embedding provider trait for converting text into fixed-dimension vectors

use async_trait::async_trait;

use crate::error::Result;

/// Capability interface to an embedding service.
///
/// Implementations:
/// - `OllamaClient`: Ollama HTTP server (nomic-embed-text and friends)
/// - `HashEmbedder`: deterministic local trigram hashing, for offline use
///   and tests
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// The output has the same length and order as the input. If any single
    /// item fails, the whole batch fails with `Error::Embedding` carrying the
    /// offending index; the caller decides whether to retry the batch.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::Error::embedding("provider returned an empty batch"))
    }

    /// Vector dimensionality; fixed per deployment, an index is only valid
    /// for one (model, dimension) pair
    fn dimensions(&self) -> usize;

    /// Model identifier the vectors belong to
    fn model_id(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &str;
}
