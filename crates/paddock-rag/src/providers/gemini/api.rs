//! Shared HTTP plumbing for the Gemini API

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::error::{Error, Result};

/// Authenticated handle to the Gemini REST API
#[derive(Clone)]
pub struct GeminiApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiApi {
    /// Create a new API handle
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://generativelanguage.googleapis.com/v1beta")
    /// * `api_key` - Gemini API key
    /// * `timeout_secs` - Per-request timeout
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::config("Gemini API key is empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// POST to `models/{model}:{method}` with the key attached
    pub fn post(&self, model: &str, method: &str) -> RequestBuilder {
        let url = format!("{}/models/{}:{}", self.base_url, model, method);
        self.client.post(url).header("x-goog-api-key", &self.api_key)
    }

    /// GET metadata for `models/{model}`, used as a health check
    pub async fn model_exists(&self, model: &str) -> bool {
        let url = format!("{}/models/{}", self.base_url, model);
        match self
            .client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
