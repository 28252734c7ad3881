//! Google Gemini API provider implementations
//!
//! - `gemini-2.0-flash` (or any `generateContent` model) for answers
//! - `text-embedding-004` (or any `embedContent` model) for embeddings
//!
//! Both authenticate with an API key sent in the `x-goog-api-key` header.

mod api;
mod gemini_client;
mod gemini_embedder;

pub use api::GeminiApi;
pub use gemini_client::GeminiClient;
pub use gemini_embedder::GeminiEmbedder;
