//! Deterministic local embedder based on trigram hashing
//!
//! Not semantically accurate like a real embedding model, but deterministic
//! and content-dependent: similar texts land near each other often enough
//! for offline use and for exercising the pipeline in tests without a
//! network.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

use super::embedding::EmbeddingProvider;

/// Trigram-hash embedding provider
#[derive(Debug)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a new hash embedder with the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower.split_whitespace().filter(|w| w.len() > 2) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let mut hash = 0u64;
                for c in window {
                    hash = hash.wrapping_mul(37).wrapping_add(*c as u64);
                }
                let dim = (hash as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }

            // Whole-word component
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += *freq as f32;
        }

        // Normalize to a unit vector so cosine scores are well-behaved
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "trigram-hash-v1"
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let embedder = HashEmbedder::new(256);
        let a = embedder.embed("the warranty period is 24 months").await.unwrap();
        let b = embedder.embed("the warranty period is 24 months").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_texts_differ() {
        let embedder = HashEmbedder::new(256);
        let a = embedder.embed("alpha beta gamma").await.unwrap();
        let b = embedder.embed("delta epsilon zeta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let embedder = HashEmbedder::new(256);
        let v = embedder.embed("some reasonably long input text here").await.unwrap();
        assert_eq!(v.len(), 256);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn batch_preserves_length_and_order() {
        let embedder = HashEmbedder::new(64);
        let texts = vec![
            "first text".to_string(),
            "second text".to_string(),
            "third text".to_string(),
        ];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(*vector, embedder.embed(text).await.unwrap());
        }
    }
}
