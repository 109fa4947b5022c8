//! Provider abstractions for embeddings, vector storage, and generation
//!
//! Trait-based capability seams: the pipelines depend only on these traits,
//! so providers can be swapped or mocked without touching chunking,
//! retrieval, or generation logic.

pub mod embedding;
pub mod generation;
pub mod hash;
pub mod memory;
pub mod ollama;
pub mod retry;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use generation::GenerationProvider;
pub use hash::HashEmbedder;
pub use memory::MemoryVectorIndex;
pub use ollama::OllamaClient;
pub use retry::RetryPolicy;
pub use vector_index::VectorIndexProvider;
