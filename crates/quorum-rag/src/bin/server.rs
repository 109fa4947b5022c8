//! RAG server binary
//!
//! Run with: cargo run -p quorum-rag --bin quorum-rag-server
//!
//! Configuration is read from the TOML file named by RAG_CONFIG, falling
//! back to built-in defaults.

use std::sync::Arc;

use quorum_rag::config::{EmbeddingBackend, RagConfig};
use quorum_rag::providers::{
    EmbeddingProvider, GenerationProvider, HashEmbedder, MemoryVectorIndex, OllamaClient,
    VectorIndexProvider,
};
use quorum_rag::server::{state::AppState, RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quorum_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("RAG_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            RagConfig::from_toml_file(&path)?
        }
        Err(_) => RagConfig::default(),
    };
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding backend: {:?}", config.embeddings.provider);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Generation model: {}", config.llm.generate_model);
    tracing::info!("  - Temperatures: {:?}", config.llm.temperatures);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.max_chars,
        config.chunking.overlap_chars
    );

    let ollama = Arc::new(OllamaClient::new(&config.llm, &config.embeddings));

    if !ollama.health_check().await {
        tracing::warn!("Ollama not reachable at {}", config.llm.base_url);
        tracing::warn!("Start it with: ollama serve && ollama pull nomic-embed-text");
    }

    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbeddingBackend::Ollama => ollama.clone(),
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(config.embeddings.dimensions)),
    };
    let index: Arc<dyn VectorIndexProvider> =
        Arc::new(MemoryVectorIndex::new(config.embeddings.dimensions));
    let generator: Arc<dyn GenerationProvider> = ollama;

    let state = AppState::new(config, embedder, index, generator)?;
    let server = RagServer::new(state);

    println!("quorum-rag server listening on http://{}", server.address());
    println!("  POST /api/ingest    - upload documents");
    println!("  POST /api/query     - ask questions");
    println!("  GET  /api/documents - list documents");

    server.start().await?;

    Ok(())
}
