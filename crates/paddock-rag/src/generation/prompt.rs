//! Prompt templates for grounded answer generation

use crate::retrieval::RetrievedChunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunks in order, one per line, capped at `max_chars` characters
    pub fn build_context(results: &[RetrievedChunk], max_chars: usize) -> String {
        let joined = results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        match joined.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                tracing::debug!(
                    "Context truncated to {} characters ({} retrieved chunks)",
                    max_chars,
                    results.len()
                );
                joined[..cut].to_string()
            }
            None => joined,
        }
    }

    /// Build the full prompt instructing a short answer from context only
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "Answer the following F1-related question in one or two sentences using only the context provided.\n\n\
             Context: {context}\n\n\
             Question: {question}\n\n\
             Answer:",
            context = context,
            question = question
        )
    }
}
