//! Flat in-process vector index
//!
//! Exact nearest-neighbour search over every entry. Snapshots are small
//! (hundreds of chunks), so a linear scan beats maintaining a graph index
//! that would be thrown away on the next data update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DistanceMetric;
use crate::error::{Error, Result};

/// A chunk and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Chunk text
    pub text: String,
    /// Embedding of the chunk
    pub embedding: Vec<f32>,
}

/// A chunk returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    /// Chunk text
    pub text: String,
    /// Distance to the query vector (lower is closer)
    pub distance: f32,
}

/// Searchable mapping from chunks to embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Fixed by the first inserted vector
    dimensions: Option<usize>,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
    /// SHA-256 of the snapshot the chunks were cut from
    snapshot_hash: Option<String>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            dimensions: None,
            metric,
            entries: Vec::new(),
            built_at: Utc::now(),
            snapshot_hash: None,
        }
    }

    /// Tag the index with the hash of its source snapshot
    pub fn with_snapshot_hash(mut self, hash: impl Into<String>) -> Self {
        self.snapshot_hash = Some(hash.into());
        self
    }

    /// Insert a chunk and its embedding
    pub fn insert(&mut self, text: impl Into<String>, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::embedding("Embedding vector is empty"));
        }
        match self.dimensions {
            Some(dims) if dims != embedding.len() => {
                return Err(Error::Embedding(format!(
                    "Embedding has {} dimensions, index expects {}",
                    embedding.len(),
                    dims
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }
        self.entries.push(IndexEntry {
            text: text.into(),
            embedding,
        });
        Ok(())
    }

    /// Return the `k` entries closest to `query`, ascending by distance
    ///
    /// Fewer than `k` entries are returned when the index is smaller.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::invalid_argument("k must be >= 1"));
        }
        let Some(dims) = self.dimensions else {
            return Ok(Vec::new());
        };
        if query.len() != dims {
            return Err(Error::Embedding(format!(
                "Query embedding has {} dimensions, index expects {}",
                query.len(),
                dims
            )));
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (distance(self.metric, query, &entry.embedding), entry))
            .collect();

        // Stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| RetrievedChunk {
                text: entry.text.clone(),
                distance,
            })
            .collect())
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensions, once known
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Distance metric used by [`VectorIndex::search`]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// When the index was built
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Hash of the source snapshot, if tagged
    pub fn snapshot_hash(&self) -> Option<&str> {
        self.snapshot_hash.as_deref()
    }
}

/// Distance between two vectors of equal length under `metric`
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum(),
        DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(metric: DistanceMetric) -> VectorIndex {
        let mut index = VectorIndex::new(metric);
        index.insert("hamilton", vec![1.0, 0.0]).unwrap();
        index.insert("leclerc", vec![0.0, 1.0]).unwrap();
        index.insert("norris", vec![0.7, 0.7]).unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample(DistanceMetric::Euclidean);
        let results = index.search(&[0.9, 0.1], 3).unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["hamilton", "norris", "leclerc"]);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_search_returns_all_when_k_exceeds_len() {
        let index = sample(DistanceMetric::Cosine);
        assert_eq!(index.search(&[1.0, 1.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let index = sample(DistanceMetric::Euclidean);
        assert!(matches!(
            index.search(&[1.0, 0.0], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::new(DistanceMetric::Euclidean);
        assert!(index.search(&[1.0, 2.0, 3.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = sample(DistanceMetric::Euclidean);
        assert!(index.insert("verstappen", vec![1.0, 2.0, 3.0]).is_err());
        assert!(matches!(
            index.search(&[1.0], 1),
            Err(Error::Embedding(_))
        ));
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
