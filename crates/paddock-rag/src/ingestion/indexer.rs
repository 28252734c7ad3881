//! Builds a searchable index from text chunks

use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::config::DistanceMetric;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::retrieval::VectorIndex;

/// Embeds chunks and assembles them into a [`VectorIndex`]
#[derive(Clone)]
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    metric: DistanceMetric,
    parallelism: usize,
}

impl Indexer {
    /// Create an indexer; `parallelism` bounds in-flight embedding calls
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        metric: DistanceMetric,
        parallelism: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            metric,
            parallelism: parallelism.max(1),
        }
    }

    /// Embedding provider used for chunks
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Durable index store
    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Distance metric of built indexes
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Build an index with one entry per chunk, in input order
    pub async fn build<'a, I>(&self, chunks: I) -> Result<VectorIndex>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.build_tagged(chunks, None).await
    }

    /// Build an index and record the hash of the snapshot it came from
    pub async fn build_for_snapshot<'a, I>(&self, chunks: I, snapshot_hash: &str) -> Result<VectorIndex>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.build_tagged(chunks, Some(snapshot_hash)).await
    }

    async fn build_tagged<'a, I>(&self, chunks: I, snapshot_hash: Option<&str>) -> Result<VectorIndex>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let start = std::time::Instant::now();
        let items: Vec<(usize, String)> = chunks.into_iter().map(str::to_owned).enumerate().collect();

        // `buffered` keeps results in input order while calls overlap
        let embedded: Vec<(String, Vec<f32>)> = stream::iter(items)
            .map(|(position, text)| -> BoxFuture<'static, Result<(String, Vec<f32>)>> {
                let embedder = Arc::clone(&self.embedder);
                Box::pin(async move {
                    let embedding = embedder.embed(&text).await.map_err(|e| {
                        Error::embedding(format!("chunk {}: {}", position, strip_stage(e)))
                    })?;
                    Ok((text, embedding))
                })
            })
            .buffered(self.parallelism)
            .try_collect()
            .await?;

        let mut index = VectorIndex::new(self.metric);
        if let Some(hash) = snapshot_hash {
            index = index.with_snapshot_hash(hash);
        }
        for (text, embedding) in embedded {
            index.insert(text, embedding)?;
        }

        tracing::info!(
            "Indexed {} chunks with {} in {:?}",
            index.len(),
            self.embedder.name(),
            start.elapsed()
        );

        if let Err(e) = self.store.save(&index).await {
            tracing::warn!("Failed to persist index via {}: {}", self.store.name(), e);
        }

        Ok(index)
    }
}

fn strip_stage(error: Error) -> String {
    match error {
        Error::Embedding(msg) => msg,
        other => other.to_string(),
    }
}
