//! API routes for the RAG server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Query
        .route("/query", post(query::query))
        // Document management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "quorum-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "RAG question-answering with multi-candidate answers and source citations",
        "endpoints": {
            "POST /api/ingest": "Upload and index documents (multipart)",
            "POST /api/query": "Ask a question; one candidate per temperature",
            "GET /api/documents": "List ingested documents",
            "GET /api/documents/:id": "Get document details",
            "DELETE /api/documents/:id": "Delete a document and its index entries"
        },
        "features": {
            "multi_candidate": "Independent answers at several sampling temperatures",
            "citations": "Every answer cites chunks from its own retrieval context",
            "partial_success": "Per-file and per-candidate failures never sink the batch",
            "idempotent_ingest": "Re-uploading a document replaces its index entries"
        }
    }))
}
