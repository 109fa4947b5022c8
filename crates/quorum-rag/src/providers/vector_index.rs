//! Vector index trait for storing and searching embeddings

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{IndexEntry, IndexMatch};

/// Capability interface to a vector store.
///
/// Implementations:
/// - `MemoryVectorIndex`: in-process brute-force cosine index
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Upsert entries keyed by chunk id. Idempotent: writing the same chunk
    /// id again replaces the previous entry, last write wins.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Top-k similarity search, descending score. `k` is bounded by the
    /// index size; an empty index yields an empty result, not an error.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>>;

    /// Remove every entry belonging to a document. Returns the number of
    /// entries removed. Used before re-ingesting so stale chunks never leak.
    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize>;

    /// Total number of stored vectors
    async fn len(&self) -> Result<usize>;

    /// Check if the index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}
