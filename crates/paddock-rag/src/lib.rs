//! paddock-rag: question answering over a live F1 data snapshot
//!
//! Clients connect over a WebSocket and send free-text questions. For each
//! question the current snapshot is read from a key/value store, split into
//! overlapping chunks, embedded into a vector index, searched for the chunks
//! closest to the question, and handed to a generative model that answers
//! in one or two sentences using only that context.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{IndexCache, PipelineAnswer, RagPipeline};
pub use types::{QueryRequest, QueryResponse};
