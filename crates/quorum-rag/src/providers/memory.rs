//! In-memory vector index with brute-force cosine search
//!
//! Exact nearest-neighbor over a map; suitable for single-node deployments
//! and tests. An external ANN store can replace it behind the same trait
//! without touching chunking or retrieval logic.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ChunkId, ChunkMetadata, IndexEntry, IndexMatch};

use super::vector_index::VectorIndexProvider;

struct StoredEntry {
    vector: Vec<f32>,
    metadata: ChunkMetadata,
}

/// In-memory vector index keyed by chunk id
pub struct MemoryVectorIndex {
    dimensions: usize,
    entries: RwLock<HashMap<ChunkId, StoredEntry>>,
}

impl MemoryVectorIndex {
    /// Create an empty index for vectors of the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndexProvider for MemoryVectorIndex {
    async fn upsert(&self, new_entries: Vec<IndexEntry>) -> Result<()> {
        let mut entries = self.entries.write();
        for entry in new_entries {
            if entry.vector.len() != self.dimensions {
                return Err(Error::vector_index(format!(
                    "dimension mismatch for {}: got {}, index holds {}",
                    entry.chunk_id,
                    entry.vector.len(),
                    self.dimensions
                )));
            }
            entries.insert(
                entry.chunk_id,
                StoredEntry {
                    vector: entry.vector,
                    metadata: entry.metadata,
                },
            );
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let entries = self.entries.read();

        let mut matches: Vec<IndexMatch> = entries
            .iter()
            .map(|(chunk_id, stored)| IndexMatch {
                chunk_id: chunk_id.clone(),
                metadata: stored.metadata.clone(),
                score: cosine_sim(vector, &stored.vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);

        Ok(matches)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, stored| stored.metadata.document_id != *document_id);
        Ok(before - entries.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "memory-cosine"
    }
}
