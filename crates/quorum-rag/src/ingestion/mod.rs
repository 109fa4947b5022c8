//! Document ingestion: multi-format loading, chunking, and the pipeline
//! composing them with the embedding gateway and vector index

mod chunker;
mod loader;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::{DocumentLoader, TextSegment};
pub use pipeline::{FileUpload, IngestPipeline};
