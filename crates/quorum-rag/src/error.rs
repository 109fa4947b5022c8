//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal to the call)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunker parameters violate `overlap_chars < max_chars`
    #[error("Invalid chunk config: overlap {overlap_chars} must be smaller than max {max_chars}")]
    InvalidChunkConfig {
        max_chars: usize,
        overlap_chars: usize,
    },

    /// No loader registered for the declared mime type
    #[error("Unsupported format for '{filename}': {mime_type}")]
    UnsupportedFormat { filename: String, mime_type: String },

    /// File content could not be decoded by its declared format
    #[error("Corrupt document '{filename}': {message}")]
    CorruptDocument { filename: String, message: String },

    /// Embedding provider failure; `batch_index` names the offending input
    /// when the provider could attribute the failure to one item
    #[error("Embedding provider error: {message}")]
    Embedding {
        batch_index: Option<usize>,
        message: String,
    },

    /// Vector index failure
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Generation failure for one candidate; carries the temperature so the
    /// candidate can be reported without losing its slot
    #[error("Generation failed at temperature {temperature}: {message}")]
    Generation { temperature: f32, message: String },

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported-format error
    pub fn unsupported_format(filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Create a corrupt-document error
    pub fn corrupt_document(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptDocument {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error not attributable to a single batch item
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            batch_index: None,
            message: message.into(),
        }
    }

    /// Create an embedding error for one item of a batch
    pub fn embedding_at(batch_index: usize, message: impl Into<String>) -> Self {
        Self::Embedding {
            batch_index: Some(batch_index),
            message: format!("batch item {}: {}", batch_index, message.into()),
        }
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create a generation error for one temperature
    pub fn generation(temperature: f32, message: impl Into<String>) -> Self {
        Self::Generation {
            temperature,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry with backoff is appropriate for this error.
    ///
    /// Only transient provider trouble qualifies; input-specific and
    /// configuration errors never do.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. } | Self::VectorIndex(_) | Self::Http(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::InvalidChunkConfig { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_chunk_config", self.to_string())
            }
            Error::UnsupportedFormat { .. } => {
                (StatusCode::BAD_REQUEST, "unsupported_format", self.to_string())
            }
            Error::CorruptDocument { .. } => {
                (StatusCode::BAD_REQUEST, "corrupt_document", self.to_string())
            }
            Error::Embedding { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "embedding_error",
                self.to_string(),
            ),
            Error::VectorIndex(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "vector_index_error",
                msg.clone(),
            ),
            Error::Generation { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_error", self.to_string())
            }
            Error::DocumentNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Document not found: {}", id),
            ),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
