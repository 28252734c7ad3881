//! Question-to-chunk retrieval

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::index::{RetrievedChunk, VectorIndex};

/// Finds the chunks closest to a question
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Create a retriever; `embedder` must be the one the index was built with
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Return up to `k` chunks ordered by increasing distance to `question`
    pub async fn query(&self, index: &VectorIndex, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(Error::invalid_argument("top_k must be at least 1"));
        }

        let query = self.embedder.embed(question).await.map_err(|e| match e {
            Error::Embedding(_) => e,
            other => Error::Embedding(format!("question: {}", other)),
        })?;

        let results = index.search(&query, k)?;
        tracing::debug!(
            "Retrieved {} of {} chunks (k={})",
            results.len(),
            index.len(),
            k
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;
    use async_trait::async_trait;
    use proptest::prelude::*;

    /// Embeds text as its first number, so distances are easy to reason about
    struct NumericEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NumericEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            text.split_whitespace()
                .find_map(|w| w.parse::<f32>().ok())
                .map(|v| vec![v])
                .ok_or_else(|| Error::embedding(format!("no number in {:?}", text)))
        }

        fn dimensions(&self) -> usize {
            1
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "numeric"
        }
    }

    fn index_of(values: &[f32]) -> VectorIndex {
        let mut index = VectorIndex::new(DistanceMetric::Euclidean);
        for v in values {
            index.insert(format!("value {}", v), vec![*v]).unwrap();
        }
        index
    }

    #[tokio::test]
    async fn test_closest_chunks_first() {
        let retriever = Retriever::new(Arc::new(NumericEmbedder));
        let index = index_of(&[10.0, 1.0, 4.0, 7.0]);

        let results = retriever.query(&index, "near 5", 2).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["value 4", "value 7"]);
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let retriever = Retriever::new(Arc::new(NumericEmbedder));
        let err = retriever.query(&index_of(&[1.0]), "1", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_question_embedding_failure() {
        let retriever = Retriever::new(Arc::new(NumericEmbedder));
        let err = retriever
            .query(&index_of(&[1.0]), "who leads?", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    proptest! {
        #[test]
        fn prop_returns_min_k_n_sorted(
            values in proptest::collection::vec(-1000.0f32..1000.0, 0..40),
            seed in -1000.0f32..1000.0,
            k in 1usize..50,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let retriever = Retriever::new(Arc::new(NumericEmbedder));
            let index = index_of(&values);

            let results = runtime
                .block_on(retriever.query(&index, &format!("question {}", seed), k))
                .unwrap();

            prop_assert_eq!(results.len(), k.min(values.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }
}
