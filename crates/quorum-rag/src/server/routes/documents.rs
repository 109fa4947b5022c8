//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::DocumentSummary;

/// Response for listing documents
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_count: usize,
}

/// GET /api/documents - List ingested documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let mut documents = state.list_documents();
    documents.sort_by(|a, b| a.filename.cmp(&b.filename));
    let total_count = documents.len();
    Json(DocumentListResponse {
        documents,
        total_count,
    })
}

/// GET /api/documents/:id - Get one document
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    state
        .get_document(&id)
        .map(Json)
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
}

/// Response for a deletion
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub document_id: Uuid,
    pub chunks_deleted: usize,
}

/// DELETE /api/documents/:id - Remove a document and its index entries
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    if state.get_document(&id).is_none() {
        return Err(Error::DocumentNotFound(id.to_string()));
    }

    let chunks_deleted = state.index().delete_by_document(&id).await?;
    state.remove_document(&id);

    tracing::info!("Deleted document {} ({} chunks)", id, chunks_deleted);

    Ok(Json(DeleteResponse {
        document_id: id,
        chunks_deleted,
    }))
}
