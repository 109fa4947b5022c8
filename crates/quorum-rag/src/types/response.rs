//! Response types for ingestion and queries

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{ChunkId, Document, DocumentFormat, Provenance};
use crate::error::Error;

/// A verified citation from a source chunk.
///
/// Only ever constructed from a chunk present in the retrieval context the
/// answer was generated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// The raw marker as emitted by the generator
    pub marker: String,
    /// Cited chunk
    pub chunk_id: ChunkId,
    /// Owning document
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Source location within the document
    pub provenance: Provenance,
    /// Exact excerpt the citation points at
    pub excerpt: String,
}

impl Citation {
    /// Format for display, e.g. `report.pdf, Page 3`
    pub fn format_inline(&self) -> String {
        match self.provenance.describe() {
            Some(loc) => format!("{}, {}", self.filename, loc),
            None => self.filename.clone(),
        }
    }
}

/// A citation marker that did not resolve to a chunk in the supplied
/// context. Recorded rather than silently dropped: a generator citing
/// material it was not given is a contract violation worth surfacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnverifiedCitation {
    /// The raw marker text
    pub marker: String,
    /// Why it failed to resolve
    pub reason: String,
}

/// One generated answer candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Sampling temperature this candidate was generated at
    pub temperature: f32,
    /// What happened
    #[serde(flatten)]
    pub outcome: CandidateOutcome,
}

/// Outcome of one generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    /// Generation succeeded
    Answer {
        /// Answer text with verified markers rewritten to `[n]` footnotes
        text: String,
        /// Model's stated reasoning, when it produced one
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
        /// Verified citations, in footnote order
        citations: Vec<Citation>,
        /// Markers that pointed outside the supplied context
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        unverified_citations: Vec<UnverifiedCitation>,
    },
    /// Generation failed; the slot is kept so the candidate sequence stays
    /// aligned with the requested temperatures
    Failed {
        /// Error message
        error: String,
    },
}

impl Candidate {
    /// Check if this candidate carries an answer
    pub fn is_answer(&self) -> bool {
        matches!(self.outcome, CandidateOutcome::Answer { .. })
    }
}

/// A retrieved source excerpt, echoed back so callers can render the
/// evidence behind the candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceExcerpt {
    /// Chunk id
    pub chunk_id: ChunkId,
    /// Owning document
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Source location
    pub provenance: Provenance,
    /// The excerpt text
    pub excerpt: String,
    /// Similarity score against the query
    pub score: f32,
}

/// Response from a RAG query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// One candidate per requested temperature, in request order
    pub candidates: Vec<Candidate>,
    /// Retrieved context excerpts, best first
    pub sources: Vec<SourceExcerpt>,
    /// Number of chunks retrieved into the context
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document id
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// Detected format
    pub format: DocumentFormat,
    /// Number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub size_bytes: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            format: doc.format,
            total_chunks: doc.total_chunks,
            size_bytes: doc.size_bytes,
            ingested_at: doc.ingested_at,
        }
    }
}

/// Failure classification for ingest reporting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No loader for the declared format
    UnsupportedFormat,
    /// Content could not be decoded
    CorruptDocument,
    /// Embedding provider failed
    Embedding,
    /// Vector index failed
    VectorIndex,
    /// Per-file timeout elapsed
    Timeout,
    /// Anything else
    Internal,
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::UnsupportedFormat { .. } => Self::UnsupportedFormat,
            Error::CorruptDocument { .. } => Self::CorruptDocument,
            Error::Embedding { .. } => Self::Embedding,
            Error::VectorIndex(_) => Self::VectorIndex,
            _ => Self::Internal,
        }
    }
}

/// Outcome for a single file in an ingest batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// File parsed, chunked, embedded and indexed
    Ingested {
        document: DocumentSummary,
        chunks_indexed: u32,
    },
    /// File failed; siblings in the batch are unaffected
    Failed {
        filename: String,
        kind: FailureKind,
        error: String,
    },
}

impl FileOutcome {
    /// Get the filename from either variant
    pub fn filename(&self) -> &str {
        match self {
            Self::Ingested { document, .. } => &document.filename,
            Self::Failed { filename, .. } => filename,
        }
    }

    /// Check if this file was successfully ingested
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ingested { .. })
    }
}

/// Summary statistics for an ingest batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Files successfully ingested
    pub ingested: usize,
    /// Files that failed
    pub failed: usize,
    /// Total chunks indexed across the batch
    pub chunks_indexed: u32,
}

impl IngestSummary {
    /// Build summary from per-file outcomes
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Ingested { chunks_indexed, .. } => {
                    summary.ingested += 1;
                    summary.chunks_indexed += chunks_indexed;
                }
                FileOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Report for one ingest batch: every submitted file's outcome, always
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Per-file outcomes in submission order
    pub files: Vec<FileOutcome>,
    /// Summary statistics
    pub summary: IngestSummary,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl IngestReport {
    /// Create a report from per-file outcomes
    pub fn new(files: Vec<FileOutcome>, processing_time_ms: u64) -> Self {
        let summary = IngestSummary::from_outcomes(&files);
        Self {
            files,
            summary,
            processing_time_ms,
        }
    }
}
