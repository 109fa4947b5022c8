//! Query-time retrieval: embed the query, search the index, assemble a
//! bounded context

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, RetryPolicy, VectorIndexProvider};
use crate::types::{ChunkId, ChunkMetadata, IndexMatch, SourceExcerpt};

/// A chunk selected into a retrieval context
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Chunk id
    pub chunk_id: ChunkId,
    /// Stored chunk metadata
    pub metadata: ChunkMetadata,
    /// Similarity against the query, higher is better
    pub score: f32,
}

/// Ordered, deduplicated, size-bounded context for one query.
///
/// Invariants: scores are non-increasing in sequence order, each chunk id
/// appears at most once, and total excerpt characters stay within the
/// budget it was assembled with.
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    entries: Vec<ScoredChunk>,
    total_chars: usize,
}

impl RetrievalContext {
    /// The empty context ("no grounding available")
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a context from raw index matches: drop sub-threshold scores,
    /// dedup by chunk id keeping the best occurrence, then take chunks in
    /// score order until the next excerpt would exceed the budget.
    pub fn assemble(matches: Vec<IndexMatch>, min_score: f32, max_context_chars: usize) -> Self {
        let mut ranked: Vec<IndexMatch> = matches
            .into_iter()
            .filter(|m| m.score >= min_score)
            .collect();

        // The index contract already orders by score, but the invariant is
        // enforced here rather than assumed
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut context = Self::default();
        let mut seen: std::collections::HashSet<ChunkId> = std::collections::HashSet::new();

        for m in ranked {
            if !seen.insert(m.chunk_id.clone()) {
                continue;
            }
            let excerpt_chars = m.metadata.excerpt.chars().count();
            if !context.entries.is_empty()
                && context.total_chars + excerpt_chars > max_context_chars
            {
                break;
            }
            context.total_chars += excerpt_chars;
            context.entries.push(ScoredChunk {
                chunk_id: m.chunk_id,
                metadata: m.metadata,
                score: m.score,
            });
        }

        context
    }

    /// Selected chunks, best first
    pub fn entries(&self) -> &[ScoredChunk] {
        &self.entries
    }

    /// Look up a chunk by id; citation validation goes through this
    pub fn get(&self, chunk_id: &ChunkId) -> Option<&ScoredChunk> {
        self.entries.iter().find(|e| e.chunk_id == *chunk_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total excerpt characters in the context
    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// Echo the context as response source excerpts
    pub fn to_sources(&self) -> Vec<SourceExcerpt> {
        self.entries
            .iter()
            .map(|e| SourceExcerpt {
                chunk_id: e.chunk_id.clone(),
                document_id: e.metadata.document_id,
                filename: e.metadata.filename.clone(),
                provenance: e.metadata.provenance.clone(),
                excerpt: e.metadata.excerpt.clone(),
                score: e.score,
            })
            .collect()
    }
}

/// Retrieval engine over the embedding gateway and vector index
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    min_score: f32,
    retry: RetryPolicy,
}

impl RetrievalEngine {
    /// Create an engine from configuration and providers
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
    ) -> Self {
        Self {
            embedder,
            index,
            min_score: config.retrieval.min_score,
            retry: RetryPolicy::new(config.llm.max_retries),
        }
    }

    /// Override the similarity threshold for one engine instance
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve a context for a query.
    ///
    /// An empty index or zero qualifying matches yields an empty context,
    /// not an error; downstream generation treats that as "no grounding
    /// available".
    pub async fn retrieve(
        &self,
        query_text: &str,
        k: usize,
        max_context_chars: usize,
    ) -> Result<RetrievalContext> {
        let query_vector = self
            .retry
            .run("query embedding", || self.embedder.embed(query_text))
            .await?;

        let matches = self
            .retry
            .run("index query", || self.index.query(&query_vector, k))
            .await?;

        let context = RetrievalContext::assemble(matches, self.min_score, max_context_chars);

        tracing::debug!(
            "Retrieved {} chunks ({} chars) for query",
            context.len(),
            context.total_chars()
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;
    use uuid::Uuid;

    fn m(doc: Uuid, index: u32, score: f32, excerpt: &str) -> IndexMatch {
        IndexMatch {
            chunk_id: ChunkId::new(doc, index),
            metadata: ChunkMetadata {
                document_id: doc,
                filename: "test.txt".to_string(),
                chunk_index: index,
                excerpt: excerpt.to_string(),
                provenance: Provenance::Whole,
            },
            score,
        }
    }

    #[test]
    fn scores_are_non_increasing_and_ids_unique() {
        let doc = Uuid::new_v4();
        let matches = vec![
            m(doc, 1, 0.4, "b"),
            m(doc, 0, 0.9, "a"),
            m(doc, 1, 0.4, "b"),
            m(doc, 2, 0.7, "c"),
        ];
        let context = RetrievalContext::assemble(matches, -1.0, 1000);

        assert_eq!(context.len(), 3);
        for pair in context.entries().windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        let ids: std::collections::HashSet<_> =
            context.entries().iter().map(|e| e.chunk_id.clone()).collect();
        assert_eq!(ids.len(), context.len());
    }

    #[test]
    fn threshold_drops_weak_matches() {
        let doc = Uuid::new_v4();
        let matches = vec![m(doc, 0, 0.9, "a"), m(doc, 1, 0.1, "b")];
        let context = RetrievalContext::assemble(matches, 0.5, 1000);
        assert_eq!(context.len(), 1);
        assert_eq!(context.entries()[0].chunk_id, ChunkId::new(doc, 0));
    }

    #[test]
    fn char_budget_truncates_in_score_order() {
        let doc = Uuid::new_v4();
        let matches = vec![
            m(doc, 0, 0.9, "aaaaaaaaaa"), // 10 chars
            m(doc, 1, 0.8, "bbbbbbbbbb"),
            m(doc, 2, 0.7, "cccccccccc"),
        ];
        let context = RetrievalContext::assemble(matches, -1.0, 20);
        assert_eq!(context.len(), 2);
        assert_eq!(context.total_chars(), 20);
        assert_eq!(context.entries()[1].chunk_id, ChunkId::new(doc, 1));
    }

    #[test]
    fn first_chunk_is_kept_even_when_over_budget() {
        let doc = Uuid::new_v4();
        let matches = vec![m(doc, 0, 0.9, "a very long excerpt that exceeds the budget")];
        let context = RetrievalContext::assemble(matches, -1.0, 10);
        // Better one oversized grounding chunk than none at all
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn empty_matches_yield_empty_context() {
        let context = RetrievalContext::assemble(Vec::new(), -1.0, 1000);
        assert!(context.is_empty());
        assert_eq!(context.total_chars(), 0);
    }
}
