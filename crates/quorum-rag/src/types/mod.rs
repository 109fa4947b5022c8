//! Core types for the RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{
    Chunk, ChunkId, ChunkMetadata, Document, DocumentFormat, IndexEntry, IndexMatch, Provenance,
};
pub use query::QueryRequest;
pub use response::{
    Candidate, CandidateOutcome, Citation, DocumentSummary, FailureKind, FileOutcome,
    IngestReport, IngestSummary, QueryResponse, SourceExcerpt, UnverifiedCitation,
};
