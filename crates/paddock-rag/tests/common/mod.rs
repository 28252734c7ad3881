//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use paddock_rag::config::{IndexMode, RagConfig};
use paddock_rag::providers::{
    EmbeddingProvider, KeyValueStore, LlmProvider, LocalVectorStore, MemoryStore, ModelProviders,
};
use paddock_rag::server::session::{Inbound, QueryChannel};
use paddock_rag::{Error, RagPipeline, Result};

pub const KEY: &str = "f1:current";

pub const STANDINGS: &str = "Team A leads the championship with 310 points.\n\n\
    Team B is second with 290 points after a strong weekend.\n\n\
    The next race is in Monza, where tyre wear is expected to be high.";

pub const DIMENSIONS: usize = 16;

/// Bag-of-words embedder: each lowercase word adds one to a bucket picked by its bytes
#[derive(Default)]
pub struct HashingEmbedder {
    pub calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % DIMENSIONS] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Generator that answers from the prompt it was given
pub struct ScriptedLlm {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    reply: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl ScriptedLlm {
    pub fn new(reply: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        }
    }

    /// Answers the championship question when the leader's line is in context
    pub fn championship() -> Self {
        Self::new(|prompt| {
            if prompt.contains("Team A leads the championship with 310 points.") {
                "Team A leads with 310 points.".to_string()
            } else {
                "I don't know.".to_string()
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        Ok((self.reply)(prompt))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Store that is unreachable for the first `failures` reads
pub struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::store_unavailable("connection refused"));
        }
        self.inner.get(key).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.failures.load(Ordering::SeqCst) == 0)
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Store that hands out queued snapshots in order, then keeps returning the last one
#[derive(Default)]
pub struct SequenceStore {
    values: Mutex<Vec<String>>,
}

impl SequenceStore {
    pub fn new(values: &[&str]) -> Self {
        let store = Self::default();
        store.queue(values);
        store
    }

    /// Replace the pending sequence
    pub fn queue(&self, values: &[&str]) {
        *self.values.lock() = values.iter().map(|v| v.to_string()).collect();
    }
}

#[async_trait]
impl KeyValueStore for SequenceStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        let mut values = self.values.lock();
        let value = if values.len() > 1 {
            Some(values.remove(0))
        } else {
            values.first().cloned()
        };
        Ok(value.map(String::into_bytes))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "sequence"
    }
}

/// Everything a test needs to drive and inspect one pipeline
pub struct Harness {
    pub pipeline: Arc<RagPipeline>,
    pub embedder: Arc<HashingEmbedder>,
    pub llm: Arc<ScriptedLlm>,
    pub config: RagConfig,
}

pub fn test_config(index_dir: &Path, mode: IndexMode) -> RagConfig {
    let mut config = RagConfig::default();
    config.chunking.chunk_size = 80;
    config.chunking.chunk_overlap = 10;
    config.embeddings.dimensions = DIMENSIONS;
    config.retrieval.top_k = 2;
    config.index.path = index_dir.join("index.json");
    config.index.mode = mode;
    config.index.refresh_interval_secs = 0;
    config
}

pub fn harness(store: Arc<dyn KeyValueStore>, index_dir: &Path, mode: IndexMode, llm: ScriptedLlm) -> Harness {
    let config = test_config(index_dir, mode);
    let embedder = Arc::new(HashingEmbedder::default());
    let llm = Arc::new(llm);
    let providers = ModelProviders {
        embedder: embedder.clone(),
        llm: llm.clone(),
    };
    let vector_store = Arc::new(LocalVectorStore::new(config.index.path.clone()));
    let pipeline = RagPipeline::from_config(&config, store, providers, vector_store).unwrap();

    Harness {
        pipeline: Arc::new(pipeline),
        embedder,
        llm,
        config,
    }
}

pub fn store_with(snapshot: &str) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.set(KEY, snapshot);
    Arc::new(store)
}

/// In-process client connection
pub struct TestChannel {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Client half of a [`TestChannel`]
pub struct TestClient {
    pub questions: mpsc::UnboundedSender<Inbound>,
    pub replies: mpsc::UnboundedReceiver<String>,
}

impl TestClient {
    pub fn ask(&self, question: &str) {
        self.questions
            .send(Inbound::Question(question.to_string()))
            .unwrap();
    }
}

pub fn test_channel() -> (TestChannel, TestClient) {
    let (question_tx, question_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    (
        TestChannel {
            inbound: question_rx,
            outbound: reply_tx,
        },
        TestClient {
            questions: question_tx,
            replies: reply_rx,
        },
    )
}

#[async_trait]
impl QueryChannel for TestChannel {
    async fn recv(&mut self) -> Inbound {
        self.inbound.recv().await.unwrap_or(Inbound::Closed)
    }

    async fn send(&mut self, reply: String) -> Result<()> {
        self.outbound
            .send(reply)
            .map_err(|_| Error::internal("client went away"))
    }
}
