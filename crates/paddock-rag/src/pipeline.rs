//! End-to-end question answering over the live snapshot
//!
//! Each question reads the current snapshot, makes sure an index built from
//! that exact snapshot is available, retrieves the closest chunks and asks
//! the generative model for a short answer.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::{IndexMode, RagConfig};
use crate::error::{Error, Result};
use crate::generation::AnswerSynthesizer;
use crate::ingestion::{Indexer, TextChunker};
use crate::providers::{DataSource, KeyValueStore, ModelProviders, VectorStoreProvider};
use crate::retrieval::{Retriever, VectorIndex};

/// Hex SHA-256 of a snapshot, used as the index cache key
pub fn snapshot_hash(snapshot: &str) -> String {
    hex::encode(Sha256::digest(snapshot.as_bytes()))
}

/// Long-lived index shared by every connection
///
/// Readers take the read lock only long enough to clone the `Arc`.
/// Rebuilds are serialised by `rebuild` so concurrent questions after a
/// data update trigger a single build.
#[derive(Default)]
pub struct IndexCache {
    current: RwLock<Option<Arc<VectorIndex>>>,
    rebuild: tokio::sync::Mutex<()>,
}

impl IndexCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Index currently served, if any
    pub fn current(&self) -> Option<Arc<VectorIndex>> {
        self.current.read().clone()
    }

    /// Cached index if it was built from the snapshot with this hash
    pub fn get_if_fresh(&self, hash: &str) -> Option<Arc<VectorIndex>> {
        self.current
            .read()
            .as_ref()
            .filter(|index| index.snapshot_hash() == Some(hash))
            .cloned()
    }

    /// Swap in a new index
    pub fn replace(&self, index: Arc<VectorIndex>) {
        *self.current.write() = Some(index);
    }
}

/// Result of answering one question
#[derive(Debug, Clone)]
pub struct PipelineAnswer {
    /// Final answer text
    pub answer: String,
    /// Number of chunks given to the model as context
    pub chunks_retrieved: usize,
    /// When the index used for retrieval was built
    pub index_built_at: DateTime<Utc>,
}

/// The full retrieval-augmented answering pipeline
pub struct RagPipeline {
    source: DataSource,
    chunker: TextChunker,
    indexer: Indexer,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
    mode: IndexMode,
    cache: IndexCache,
}

impl RagPipeline {
    /// Assemble the pipeline from validated config and its collaborators
    pub fn from_config(
        config: &RagConfig,
        store: Arc<dyn KeyValueStore>,
        providers: ModelProviders,
        vector_store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::from_config(&config.chunking)?;
        let indexer = Indexer::new(
            Arc::clone(&providers.embedder),
            vector_store,
            config.retrieval.distance,
            config.index.parallel_embeddings,
        );

        Ok(Self {
            source: DataSource::new(store, config.store.key.clone()),
            chunker,
            indexer,
            retriever: Retriever::new(providers.embedder),
            synthesizer: AnswerSynthesizer::new(providers.llm, config.generation.max_context_chars),
            top_k: config.retrieval.top_k,
            mode: config.index.mode,
            cache: IndexCache::new(),
        })
    }

    /// Default number of chunks retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Index freshness strategy
    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    /// Snapshot source
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Shared index cache
    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Answer one question with the default `top_k`
    pub async fn answer(&self, question: &str) -> Result<String> {
        Ok(self.answer_with(question, self.top_k).await?.answer)
    }

    /// Answer one question retrieving `top_k` chunks
    pub async fn answer_with(&self, question: &str, top_k: usize) -> Result<PipelineAnswer> {
        if question.trim().is_empty() {
            return Err(Error::invalid_argument("question is empty"));
        }
        if top_k == 0 {
            return Err(Error::invalid_argument("top_k must be at least 1"));
        }

        let start = Instant::now();
        let index = self.current_index().await?;
        let retrieved = self.retriever.query(&index, question, top_k).await?;
        let answer = self.synthesizer.synthesize(&retrieved, question).await?;

        tracing::info!(
            chunks = retrieved.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Answered question"
        );

        Ok(PipelineAnswer {
            answer,
            chunks_retrieved: retrieved.len(),
            index_built_at: index.built_at(),
        })
    }

    /// Index matching the snapshot currently in the store
    pub async fn current_index(&self) -> Result<Arc<VectorIndex>> {
        let snapshot = self.source.fetch_current_data().await?;
        let hash = snapshot_hash(&snapshot);

        if self.mode == IndexMode::PerQuery {
            let index = Arc::new(self.build(&snapshot, &hash).await?);
            self.cache.replace(Arc::clone(&index));
            return Ok(index);
        }

        if let Some(index) = self.cache.get_if_fresh(&hash) {
            return Ok(index);
        }

        let _guard = self.cache.rebuild.lock().await;
        // The snapshot may have moved on while we waited for the lock
        let snapshot = self.source.fetch_current_data().await?;
        let hash = snapshot_hash(&snapshot);
        if let Some(index) = self.cache.get_if_fresh(&hash) {
            return Ok(index);
        }

        let index = Arc::new(self.build(&snapshot, &hash).await?);
        self.cache.replace(Arc::clone(&index));
        Ok(index)
    }

    /// Rebuild the cached index if the snapshot changed; true when a build ran
    pub async fn refresh(&self) -> Result<bool> {
        let before = self.cache.current();
        let after = self.current_index().await?;
        Ok(before.map_or(true, |b| !Arc::ptr_eq(&b, &after)))
    }

    /// Seed the cache from the persisted index artifact
    ///
    /// Returns true when an index was loaded. Artifacts built with a different
    /// embedding size or distance metric are ignored.
    pub async fn warm_start(&self) -> Result<bool> {
        let store = self.indexer.store();
        let Some(index) = store.load().await? else {
            tracing::info!("No persisted index found via {}", store.name());
            return Ok(false);
        };

        let expected = self.indexer.embedder().dimensions();
        if index.dimensions().is_some_and(|d| d != expected) {
            tracing::warn!(
                "Ignoring persisted index with {:?} dimensions (embedder produces {})",
                index.dimensions(),
                expected
            );
            return Ok(false);
        }
        if index.metric() != self.indexer.metric() {
            tracing::warn!("Ignoring persisted index built with {:?}", index.metric());
            return Ok(false);
        }
        if index.snapshot_hash().is_none() {
            tracing::warn!("Ignoring persisted index without a snapshot hash");
            return Ok(false);
        }

        tracing::info!(
            "Loaded persisted index ({} chunks, built {})",
            index.len(),
            index.built_at()
        );
        self.cache.replace(Arc::new(index));
        Ok(true)
    }

    /// Periodically refresh the index in the background
    ///
    /// Returns `None` when refreshing is disabled (zero interval or per-query mode).
    pub fn spawn_refresher(self: &Arc<Self>, interval_secs: u64) -> Option<JoinHandle<()>> {
        if interval_secs == 0 || self.mode == IndexMode::PerQuery {
            return None;
        }

        let pipeline = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match pipeline.refresh().await {
                    Ok(true) => tracing::debug!("Background refresh rebuilt the index"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(stage = e.stage(), "Background refresh failed: {}", e),
                }
            }
        }))
    }

    async fn build(&self, snapshot: &str, hash: &str) -> Result<VectorIndex> {
        tracing::debug!(
            "Building index for snapshot {} ({} chars)",
            &hash[..12],
            snapshot.chars().count()
        );
        self.indexer
            .build_for_snapshot(self.chunker.split(snapshot), hash)
            .await
    }
}
