//! quorum-rag: document question-answering with multi-candidate answers
//!
//! A retrieval-augmented-generation pipeline: documents are parsed,
//! chunked, embedded and indexed at upload time; at query time the index is
//! searched, a bounded context is assembled, and several answer candidates
//! are generated at different sampling temperatures, each with its
//! reasoning and citations resolved against the exact context it was
//! given. External embedding, vector-store and generation services sit
//! behind capability traits, so providers can be swapped or mocked without
//! touching the pipeline logic.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{FileUpload, IngestPipeline};
pub use retrieval::{RetrievalContext, RetrievalEngine};
pub use types::{
    Candidate, Chunk, ChunkId, Citation, Document, IngestReport, QueryRequest, QueryResponse,
};
