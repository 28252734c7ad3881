//! Provider abstractions for the pipeline's external collaborators
//!
//! Each collaborator sits behind a trait so backends can be swapped
//! (Ollama or Gemini) and tests can inject doubles.

pub mod data_source;
pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;
pub mod vector_store;

pub use data_source::{DataSource, KeyValueStore, MemoryStore, RedisStore, NO_DATA_PLACEHOLDER};
pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use vector_store::{LocalVectorStore, VectorStoreProvider};

use std::sync::Arc;

use crate::config::{ProviderKind, RagConfig};
use crate::error::{Error, Result};
use crate::generation::OllamaClient;
use gemini::{GeminiApi, GeminiClient, GeminiEmbedder};
use ollama::{OllamaEmbedder, OllamaLlm};

/// Embedding and generation providers selected by configuration
pub struct ModelProviders {
    /// Embedding provider (Ollama or Gemini)
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// LLM provider (Gemini or Ollama)
    pub llm: Arc<dyn LlmProvider>,
}

impl ModelProviders {
    /// Build providers from config, sharing one HTTP client when both use the same backend
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let embeddings = &config.embeddings;
        let llm = &config.llm;

        let providers: (Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>) =
            match (embeddings.provider, llm.provider) {
                (ProviderKind::Ollama, ProviderKind::Ollama)
                    if embeddings.base_url == llm.base_url =>
                {
                    let client = Arc::new(OllamaClient::new(
                        &llm.base_url,
                        llm.timeout_secs.max(embeddings.timeout_secs),
                    )?);
                    (
                        Arc::new(OllamaEmbedder::from_client(
                            Arc::clone(&client),
                            embeddings.dimensions,
                            embeddings.model.clone(),
                        )),
                        Arc::new(OllamaLlm::from_client(
                            client,
                            llm.model.clone(),
                            llm.temperature,
                        )),
                    )
                }
                (ProviderKind::Gemini, ProviderKind::Gemini)
                    if embeddings.gemini_base_url == llm.base_url =>
                {
                    let api = gemini_api(
                        config,
                        &llm.base_url,
                        llm.timeout_secs.max(embeddings.timeout_secs),
                    )?;
                    (
                        Arc::new(GeminiEmbedder::new(
                            api.clone(),
                            embeddings.model.clone(),
                            embeddings.dimensions,
                        )),
                        Arc::new(GeminiClient::new(api, llm.model.clone(), llm.temperature)),
                    )
                }
                (embed_kind, llm_kind) => {
                    let embedder: Arc<dyn EmbeddingProvider> = match embed_kind {
                        ProviderKind::Ollama => Arc::new(OllamaEmbedder::new(embeddings)?),
                        ProviderKind::Gemini => Arc::new(GeminiEmbedder::new(
                            gemini_api(config, &embeddings.gemini_base_url, embeddings.timeout_secs)?,
                            embeddings.model.clone(),
                            embeddings.dimensions,
                        )),
                    };
                    let generator: Arc<dyn LlmProvider> = match llm_kind {
                        ProviderKind::Ollama => Arc::new(OllamaLlm::new(llm)?),
                        ProviderKind::Gemini => Arc::new(GeminiClient::from_config(llm)?),
                    };
                    (embedder, generator)
                }
            };

        tracing::info!(
            "Providers ready: embeddings={} ({}), llm={} ({})",
            providers.0.name(),
            embeddings.model,
            providers.1.name(),
            providers.1.model()
        );

        Ok(Self {
            embedder: providers.0,
            llm: providers.1,
        })
    }
}

fn gemini_api(config: &RagConfig, base_url: &str, timeout_secs: u64) -> Result<GeminiApi> {
    let api_key = config
        .llm
        .api_key
        .as_deref()
        .ok_or_else(|| Error::config("Gemini API key is not configured"))?;
    GeminiApi::new(base_url, api_key, timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_without_key_fails() {
        let config = RagConfig::default();
        assert!(matches!(
            ModelProviders::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_all_ollama_builds_without_key() {
        let mut config = RagConfig::default();
        config.llm.provider = ProviderKind::Ollama;
        config.llm.base_url = config.embeddings.base_url.clone();
        config.llm.model = "phi3".to_string();

        let providers = ModelProviders::from_config(&config).unwrap();
        assert_eq!(providers.embedder.name(), "ollama");
        assert_eq!(providers.llm.model(), "phi3");
        assert_eq!(providers.embedder.dimensions(), 768);
    }

    /// Serves `embedContent` with a fixed vector on an ephemeral port
    async fn fake_gemini() -> String {
        use axum::{extract::Path, routing::post, Json, Router};

        let app = Router::new().route(
            "/models/:call",
            post(|Path(call): Path<String>| async move {
                assert_eq!(call, "text-embedding-004:embedContent");
                Json(serde_json::json!({"embedding": {"values": [0.25, 0.5, 0.75]}}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        base
    }

    #[tokio::test]
    async fn test_gemini_embeddings_with_ollama_llm_use_gemini_root() {
        let mut config = RagConfig::default();
        config.embeddings.provider = ProviderKind::Gemini;
        config.embeddings.model = "text-embedding-004".to_string();
        config.embeddings.dimensions = 3;
        config.embeddings.gemini_base_url = fake_gemini().await;
        config.llm.provider = ProviderKind::Ollama;
        config.llm.base_url = "http://127.0.0.1:9".to_string();
        config.llm.model = "phi3".to_string();
        config.llm.api_key = Some("test-key".to_string());

        let providers = ModelProviders::from_config(&config).unwrap();
        assert_eq!(providers.embedder.name(), "gemini");
        assert_eq!(providers.llm.name(), "ollama");

        let embedding = providers.embedder.embed("Team A leads").await.unwrap();
        assert_eq!(embedding, vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_gemini_embeddings_default_to_public_root() {
        let config = RagConfig::default();
        assert_eq!(config.embeddings.gemini_base_url, crate::config::GEMINI_BASE_URL);
        assert_ne!(config.embeddings.gemini_base_url, config.embeddings.base_url);
    }
}
