//! API routes for the RAG server

pub mod query;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_rag))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    let index = state.pipeline().cache().current();

    Json(json!({
        "name": "paddock-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over the live F1 snapshot",
        "endpoints": {
            "GET /ws": "WebSocket: send a question, receive an answer",
            "POST /api/query": "Answer a single question",
            "GET /api/info": "Service metadata",
            "GET /health": "Liveness",
            "GET /ready": "Readiness"
        },
        "models": {
            "embeddings": config.embeddings.model,
            "llm": config.llm.model
        },
        "index": {
            "mode": config.index.mode,
            "chunks": index.as_ref().map(|i| i.len()),
            "built_at": index.as_ref().map(|i| i.built_at())
        },
        "store_key": config.store.key
    }))
}
