//! Response types for RAG queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineAnswer;

/// Answer returned by `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Chunks passed to the model as context
    pub chunks_retrieved: usize,
    /// When the index used for retrieval was built
    pub index_built_at: DateTime<Utc>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Wrap a pipeline answer with its timing
    pub fn from_answer(answer: PipelineAnswer, processing_time_ms: u64) -> Self {
        Self {
            answer: answer.answer,
            chunks_retrieved: answer.chunks_retrieved,
            index_built_at: answer.index_built_at,
            processing_time_ms,
        }
    }
}
