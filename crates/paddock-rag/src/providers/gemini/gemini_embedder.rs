//! Gemini embedding provider using text-embedding-004

use async_trait::async_trait;

use super::api::GeminiApi;
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;

/// Gemini embedding provider
pub struct GeminiEmbedder {
    api: GeminiApi,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder
    ///
    /// # Arguments
    /// * `api` - Authenticated API handle
    /// * `model` - Model name (e.g., "text-embedding-004")
    /// * `dimensions` - Vector size the model produces (768 for text-embedding-004)
    pub fn new(api: GeminiApi, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            api,
            model: model.into(),
            dimensions,
        }
    }
}

#[derive(serde::Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
}

#[derive(serde::Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(serde::Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(serde::Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .api
            .post(&self.model, "embedContent")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Gemini embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Gemini embedding failed ({}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse Gemini embedding: {}", e)))?;

        if embed_response.embedding.values.is_empty() {
            return Err(Error::embedding("Gemini returned an empty embedding"));
        }
        Ok(embed_response.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.api.model_exists(&self.model).await)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
