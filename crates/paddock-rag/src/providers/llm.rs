//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-to-text generation
///
/// Implementations:
/// - `GeminiClient`: Google Gemini API (gemini-2.0-flash)
/// - `OllamaLlm`: Local Ollama server (phi3, llama3, etc.)
///
/// An empty string is a valid response; callers decide how to present it.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate raw text for a fully assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
