//! Configuration for the RAG system
//!
//! Everything tunable lives here: providers read their endpoints and models
//! from the config object handed to them at construction, never from ambient
//! global state.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Ingestion processing configuration
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Bad values here indicate a misconfigured deployment, so they are fatal
    /// rather than per-request failures.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            return Err(Error::InvalidChunkConfig {
                max_chars: self.chunking.max_chars,
                overlap_chars: self.chunking.overlap_chars,
            });
        }
        if self.chunking.overlap_chars >= self.chunking.max_chars {
            return Err(Error::InvalidChunkConfig {
                max_chars: self.chunking.max_chars,
                overlap_chars: self.chunking.overlap_chars,
            });
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be non-zero".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be non-zero".to_string()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be non-zero".to_string()));
        }
        if self.llm.temperatures.is_empty() {
            return Err(Error::Config(
                "llm.temperatures must contain at least one entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Which embedding backend to wire at startup
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama HTTP server
    #[default]
    Ollama,
    /// Deterministic local trigram-hash embedder (offline, no server needed)
    Hash,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding backend
    pub provider: EmbeddingBackend,
    /// Embedding model identifier; an index is only valid for one model
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Number of chunk texts sent to the provider per batch call
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub max_chars: usize,
    /// Overlap carried from the previous chunk, must be < max_chars
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: usize,
    /// Minimum similarity score; the default admits the entire top-k
    pub min_score: f32,
    /// Maximum total excerpt characters assembled into one context
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_score: -1.0,
            max_context_chars: 8000,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name (for the Ollama backend)
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperatures; one answer candidate is produced per entry
    pub temperatures: Vec<f32>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient embedding/index failures.
    /// Generation calls are never retried.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperatures: vec![0.2, 0.7, 1.0],
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Ingestion processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files processed concurrently (default: CPU count, max 8)
    pub parallel_files: Option<usize>,
    /// Timeout for processing a single file in seconds
    pub file_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_files: None,
            file_timeout_secs: 120,
        }
    }
}

impl ProcessingConfig {
    /// Effective file-level worker count
    pub fn effective_parallel_files(&self) -> usize {
        self.parallel_files
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}
