//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::FileUpload;
use crate::server::state::AppState;
use crate::types::{FileOutcome, IngestReport};

/// POST /api/ingest - Upload and process a batch of files
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Failed to read multipart field: {}", e)))?
    {
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4()));

        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Failed to read '{}': {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes, {})", filename, data.len(), mime_type);

        files.push(FileUpload {
            filename,
            mime_type,
            bytes: data.to_vec(),
        });
    }

    let pipeline = state.ingest_pipeline()?;
    let report = pipeline.ingest(files).await;

    // Register successful documents so /api/documents reflects the index
    for outcome in &report.files {
        if let FileOutcome::Ingested { document, .. } = outcome {
            state.add_document(document.clone());
        }
    }

    tracing::info!(
        "Ingest batch complete: {} ingested, {} failed, {} chunks",
        report.summary.ingested,
        report.summary.failed,
        report.summary.chunks_indexed
    );

    Ok(Json(report))
}
