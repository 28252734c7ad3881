//! Single-shot question endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer one question
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let pipeline = state.pipeline();
    let top_k = request.top_k.unwrap_or_else(|| pipeline.top_k());

    tracing::info!("Query: \"{}\" (top_k={})", request.question, top_k);

    let answer = pipeline.answer_with(&request.question, top_k).await?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Query completed in {}ms, {} chunks",
        processing_time_ms,
        answer.chunks_retrieved
    );

    Ok(Json(QueryResponse::from_answer(answer, processing_time_ms)))
}
