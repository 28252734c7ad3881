//! Configuration for the question answering server
//!
//! Built once at startup (defaults, optional TOML file, environment) and
//! handed to every component constructor. Nothing here is mutated after
//! [`RagConfig::validate`] succeeds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variables consulted for the Gemini API key, in order
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Public Gemini REST root
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Listener configuration
    pub server: ServerConfig,
    /// Live snapshot store
    pub store: StoreConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding collaborator
    pub embeddings: EmbeddingConfig,
    /// Generative model collaborator
    pub llm: LlmConfig,
    /// Retrieval parameters
    pub retrieval: RetrievalConfig,
    /// Prompt assembly
    pub generation: GenerationConfig,
    /// Index lifecycle and persistence
    pub index: IndexConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5050,
            enable_cors: true,
        }
    }
}

/// Key/value store holding the current snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis connection URL
    pub url: String,
    /// Key holding the snapshot text
    pub key: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            key: "f1:current".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Which service backs a collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// Google Gemini API
    Gemini,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend serving embeddings
    pub provider: ProviderKind,
    /// Model to use
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Ollama base URL (ignored for Gemini)
    pub base_url: String,
    /// Gemini API root (ignored for Ollama)
    pub gemini_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            base_url: "http://localhost:11434".to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend serving generation
    pub provider: ProviderKind,
    /// Generation model name
    pub model: String,
    /// Gemini API key (falls back to GEMINI_API_KEY / GOOGLE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL of the model API
    pub base_url: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            base_url: GEMINI_BASE_URL.to_string(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

/// Distance used to rank chunks against a question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared L2 distance
    #[default]
    Euclidean,
    /// One minus cosine similarity
    Cosine,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the synthesizer
    pub top_k: usize,
    /// Distance metric for nearest-neighbour search
    pub distance: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            distance: DistanceMetric::Euclidean,
        }
    }
}

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on the context block, in characters
    pub max_context_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 4000,
        }
    }
}

/// When the index is rebuilt
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Keep a long-lived index, rebuild only when the snapshot changes
    #[default]
    Cached,
    /// Rebuild from scratch for every question
    PerQuery,
}

/// Index lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Location of the persisted index artifact
    pub path: PathBuf,
    /// Rebuild policy
    pub mode: IndexMode,
    /// Background refresh period in seconds (0 disables the refresher)
    pub refresh_interval_secs: u64,
    /// Concurrent embedding calls while building
    pub parallel_embeddings: usize,
    /// Load the persisted artifact at startup
    pub warm_start: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vector_index").join("index.json"),
            mode: IndexMode::Cached,
            refresh_interval_secs: 30,
            parallel_embeddings: 4,
            warm_start: true,
        }
    }
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Fill values that may come from the environment
    pub fn apply_env(&mut self) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = API_KEY_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty());
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.trim().is_empty() {
                self.store.url = url;
            }
        }
    }

    /// Reject configurations that cannot serve a single question
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config("server.port must be > 0"));
        }
        if self.store.key.is_empty() {
            return Err(Error::config("store.key must not be empty"));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be > 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be > 0"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be >= 1"));
        }
        if self.generation.max_context_chars == 0 {
            return Err(Error::config("generation.max_context_chars must be > 0"));
        }
        if self.index.parallel_embeddings == 0 {
            return Err(Error::config("index.parallel_embeddings must be >= 1"));
        }
        let needs_key = self.llm.provider == ProviderKind::Gemini
            || self.embeddings.provider == ProviderKind::Gemini;
        if needs_key && self.llm.api_key.is_none() {
            return Err(Error::config(
                "Gemini selected but no API key configured (llm.api_key or GEMINI_API_KEY)",
            ));
        }
        Ok(())
    }

    /// Listener address as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
