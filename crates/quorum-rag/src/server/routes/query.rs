//! Query endpoint: retrieve, generate candidates, resolve citations

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Ask a question against the ingested documents
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let config = state.config();

    tracing::info!("Query: \"{}\"", request.question);

    let top_k = request.top_k.unwrap_or(config.retrieval.top_k);
    let max_context_chars = request
        .max_context_chars
        .unwrap_or(config.retrieval.max_context_chars);
    let temperatures = request
        .temperatures
        .clone()
        .unwrap_or_else(|| config.llm.temperatures.clone());

    let mut retrieval = state.retrieval_engine();
    if let Some(min_score) = request.min_score {
        retrieval = retrieval.with_min_score(min_score);
    }

    let context = retrieval
        .retrieve(&request.question, top_k, max_context_chars)
        .await?;

    if context.is_empty() {
        tracing::info!("No grounding available for query");
    }

    // All candidates are generated even without grounding; the prompt then
    // instructs the model to say so instead of inventing an answer
    let candidates = state
        .generation_engine()
        .generate(&request.question, &context, &temperatures)
        .await;

    let response = QueryResponse {
        chunks_retrieved: context.len(),
        sources: context.to_sources(),
        candidates,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    tracing::info!(
        "Query complete in {}ms: {} candidates, {} chunks retrieved",
        response.processing_time_ms,
        response.candidates.len(),
        response.chunks_retrieved
    );

    Ok(Json(response))
}
