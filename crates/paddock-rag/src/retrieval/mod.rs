//! Vector index and similarity retrieval

pub mod index;
mod search;

pub use index::{cosine_similarity, distance, IndexEntry, RetrievedChunk, VectorIndex};
pub use search::Retriever;
