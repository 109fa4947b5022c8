//! Document and chunk types with provenance tracking for citations

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Namespace for deriving document ids from filenames (UUID v5).
///
/// Uploads carry only a filename, so the id must be a pure function of it:
/// re-uploading the same file addresses the same document and re-ingestion
/// overwrites instead of appending.
const DOCUMENT_NAMESPACE: Uuid = Uuid::from_u128(0x9f1c_6d2a_41e7_4c85_a3b0_5e8f_72d4_c916);

/// Supported document formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Word-processor document (.docx)
    Docx,
    /// Plain text file
    Text,
    /// Markdown file (treated as plain text)
    Markdown,
    /// Delimited tabular data (.csv)
    Csv,
    /// Spreadsheet (.xlsx / .xls)
    Xlsx,
}

impl DocumentFormat {
    /// Detect format from the declared mime type, falling back to the file
    /// extension when the declared type is generic or absent.
    pub fn detect(filename: &str, mime_type: &str) -> Option<Self> {
        match mime_type {
            "application/pdf" => return Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                return Some(Self::Docx)
            }
            "text/plain" => return Some(Self::Text),
            "text/markdown" => return Some(Self::Markdown),
            "text/csv" | "application/csv" => return Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => return Some(Self::Xlsx),
            _ => {}
        }

        // Generic or missing mime type: guess from the filename
        let guessed = mime_guess::from_path(filename).first_raw().unwrap_or("");
        match guessed {
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "text/plain" => Some(Self::Text),
            "text/markdown" => Some(Self::Markdown),
            "text/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => Some(Self::Xlsx),
            _ => match filename.rsplit('.').next().unwrap_or("").to_lowercase().as_str() {
                "pdf" => Some(Self::Pdf),
                "docx" => Some(Self::Docx),
                "txt" | "text" => Some(Self::Text),
                "md" | "markdown" => Some(Self::Markdown),
                "csv" => Some(Self::Csv),
                "xlsx" | "xls" => Some(Self::Xlsx),
                _ => None,
            },
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Text => "Text File",
            Self::Markdown => "Markdown",
            Self::Csv => "CSV",
            Self::Xlsx => "Spreadsheet",
        }
    }
}

/// Where a chunk's text came from inside its document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Page number (1-indexed, for PDF/DOCX)
    Page { number: u32 },
    /// Row range (1-indexed, inclusive, for tabular data)
    Rows { start: u32, end: u32 },
    /// Sheet name (for spreadsheets)
    Sheet { name: String },
    /// Whole-document text with no finer position
    Whole,
}

impl Provenance {
    /// Human-readable location, if there is one
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::Page { number } => Some(format!("Page {}", number)),
            Self::Rows { start, end } => Some(format!("Rows {}-{}", start, end)),
            Self::Sheet { name } => Some(format!("Sheet: {}", name)),
            Self::Whole => None,
        }
    }
}

/// Stable chunk identifier: `{document_id}#{sequence_index}`.
///
/// Derived, never random and never content-addressed, so chunking the same
/// document twice yields the same ids and identical text in two different
/// documents does not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Build the id for a document's nth chunk
    pub fn new(document_id: Uuid, index: u32) -> Self {
        Self(format!("{}#{}", document_id, index))
    }

    /// Parse an id back into its parts; `None` if the string is not a
    /// well-formed chunk id
    pub fn parse(s: &str) -> Option<Self> {
        let (doc, idx) = s.split_once('#')?;
        let document_id = Uuid::parse_str(doc).ok()?;
        let index: u32 = idx.parse().ok()?;
        Some(Self::new(document_id, index))
    }

    /// The owning document's id
    pub fn document_id(&self) -> Option<Uuid> {
        self.0.split_once('#').and_then(|(doc, _)| Uuid::parse_str(doc).ok())
    }

    /// The chunk's sequence index within its document
    pub fn index(&self) -> Option<u32> {
        self.0.split_once('#').and_then(|(_, idx)| idx.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document that has been ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document id, derived from the filename
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// Declared mime type
    pub mime_type: String,
    /// Detected format
    pub format: DocumentFormat,
    /// SHA-256 of the raw bytes
    pub content_hash: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Number of chunks created
    pub total_chunks: u32,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Derive the stable document id for a filename
    pub fn derive_id(filename: &str) -> Uuid {
        Uuid::new_v5(&DOCUMENT_NAMESPACE, filename.as_bytes())
    }

    /// Create a new document record
    pub fn new(filename: String, mime_type: String, format: DocumentFormat, bytes: &[u8]) -> Self {
        Self {
            id: Self::derive_id(&filename),
            filename,
            mime_type,
            format,
            content_hash: hash_bytes(bytes),
            size_bytes: bytes.len() as u64,
            total_chunks: 0,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk id
    pub id: ChunkId,
    /// Parent document id
    pub document_id: Uuid,
    /// Text content
    pub text: String,
    /// Byte offsets of the slice within its source segment
    pub char_start: usize,
    pub char_end: usize,
    /// Characters at the head of `text` repeated from the previous chunk
    pub overlap_with_prev: usize,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Source location for citations
    pub provenance: Provenance,
}

/// Metadata stored alongside a vector in the index.
///
/// Carries everything the query side needs to cite the chunk without
/// re-reading the document: owning document, filename, the excerpt itself
/// and its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning document id
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// The chunk's text
    pub excerpt: String,
    /// Source location
    pub provenance: Provenance,
}

impl ChunkMetadata {
    /// Build metadata from a chunk and its document
    pub fn from_chunk(chunk: &Chunk, filename: &str) -> Self {
        Self {
            document_id: chunk.document_id,
            filename: filename.to_string(),
            chunk_index: chunk.chunk_index,
            excerpt: chunk.text.clone(),
            provenance: chunk.provenance.clone(),
        }
    }
}

/// An entry submitted to the vector index
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Chunk id, the upsert key
    pub chunk_id: ChunkId,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

/// A match returned by the vector index
#[derive(Debug, Clone)]
pub struct IndexMatch {
    /// Matched chunk id
    pub chunk_id: ChunkId,
    /// Stored metadata
    pub metadata: ChunkMetadata,
    /// Similarity score, higher is more similar
    pub score: f32,
}

/// Hash raw bytes for content identity
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_stable_per_filename() {
        assert_eq!(Document::derive_id("report.pdf"), Document::derive_id("report.pdf"));
        assert_ne!(Document::derive_id("report.pdf"), Document::derive_id("other.pdf"));
    }

    #[test]
    fn chunk_id_round_trips() {
        let doc = Document::derive_id("report.pdf");
        let id = ChunkId::new(doc, 7);
        let parsed = ChunkId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.document_id(), Some(doc));
        assert_eq!(parsed.index(), Some(7));
    }

    #[test]
    fn chunk_id_rejects_garbage() {
        assert!(ChunkId::parse("not-a-chunk-id").is_none());
        assert!(ChunkId::parse("abc#1").is_none());
        assert!(ChunkId::parse("9f1c6d2a-41e7-4c85-a3b0-5e8f72d4c916#x").is_none());
    }

    #[test]
    fn format_detection_prefers_declared_mime() {
        assert_eq!(
            DocumentFormat::detect("data.bin", "application/pdf"),
            Some(DocumentFormat::Pdf)
        );
        // Generic mime falls back to the extension
        assert_eq!(
            DocumentFormat::detect("notes.txt", "application/octet-stream"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::detect("image.png", "image/png"), None);
    }
}
