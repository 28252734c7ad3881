//! Query request types

use serde::{Deserialize, Serialize};

/// Question submitted over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (defaults to `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_is_optional() {
        let request: QueryRequest = serde_json::from_str(r#"{"question":"Who leads?"}"#).unwrap();
        assert_eq!(request.question, "Who leads?");
        assert_eq!(request.top_k, None);

        let request: QueryRequest =
            serde_json::from_str(r#"{"question":"Who leads?","top_k":5}"#).unwrap();
        assert_eq!(request.top_k, Some(5));
    }
}
