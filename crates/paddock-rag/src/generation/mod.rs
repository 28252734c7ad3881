//! Answer generation from retrieved context

pub mod ollama;
pub mod prompt;

pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::retrieval::RetrievedChunk;

/// Returned when the model produces no text
pub const NO_ANSWER_SENTINEL: &str = "Sorry, I could not generate an answer at this time.";

/// Turns retrieved chunks and a question into a final answer
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
    max_context_chars: usize,
}

impl AnswerSynthesizer {
    /// Create a synthesizer calling `llm` with contexts of at most `max_context_chars`
    pub fn new(llm: Arc<dyn LlmProvider>, max_context_chars: usize) -> Self {
        Self {
            llm,
            max_context_chars,
        }
    }

    /// Generative model in use
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Build the prompt, call the model once, and clean up its output
    pub async fn synthesize(&self, retrieved: &[RetrievedChunk], question: &str) -> Result<String> {
        let context = PromptBuilder::build_context(retrieved, self.max_context_chars);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        tracing::debug!(
            "Generating answer with {} ({} context chars)",
            self.llm.model(),
            context.len()
        );

        let raw = self.llm.generate(&prompt).await.map_err(|e| match e {
            Error::Generation(_) => e,
            other => Error::Generation(other.to_string()),
        })?;

        let answer = raw.trim();
        if answer.is_empty() {
            tracing::warn!("Model {} returned no text", self.llm.model());
            return Ok(NO_ANSWER_SENTINEL.to_string());
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedLlm {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(reply: Result<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::internal(e.to_string())),
            }
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

    fn retrieved(text: &str) -> Vec<RetrievedChunk> {
        vec![RetrievedChunk {
            text: text.to_string(),
            distance: 0.1,
        }]
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let llm = ScriptedLlm::new(Ok("  Team A leads with 310 points.\n".to_string()));
        let synthesizer = AnswerSynthesizer::new(llm.clone(), 4000);

        let answer = synthesizer
            .synthesize(&retrieved("Team A leads the championship with 310 points."), "Who leads?")
            .await
            .unwrap();

        assert_eq!(answer, "Team A leads with 310 points.");
        let prompts = llm.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context: Team A leads the championship with 310 points."));
        assert!(prompts[0].contains("Question: Who leads?"));
    }

    #[tokio::test]
    async fn test_empty_output_becomes_sentinel() {
        for reply in ["", "   \n\t"] {
            let synthesizer = AnswerSynthesizer::new(ScriptedLlm::new(Ok(reply.to_string())), 4000);
            let answer = synthesizer.synthesize(&retrieved("x"), "q").await.unwrap();
            assert_eq!(answer, "Sorry, I could not generate an answer at this time.");
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_generation_error() {
        let llm = ScriptedLlm::new(Err(Error::internal("connection reset")));
        let synthesizer = AnswerSynthesizer::new(llm.clone(), 4000);

        let err = synthesizer.synthesize(&retrieved("x"), "q").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(llm.prompts.lock().len(), 1, "no retries");
    }
}
