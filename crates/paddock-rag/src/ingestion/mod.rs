//! Snapshot ingestion: chunking and index construction

mod chunker;
mod indexer;

pub use chunker::{Chunks, TextChunker};
pub use indexer::Indexer;
