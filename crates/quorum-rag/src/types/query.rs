//! Query request types

use serde::{Deserialize, Serialize};

/// Query request for the RAG system.
///
/// Fields left unset fall back to the deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default: config `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Sampling temperatures, one candidate per entry
    /// (default: config `llm.temperatures`)
    #[serde(default)]
    pub temperatures: Option<Vec<f32>>,

    /// Context character budget (default: config `retrieval.max_context_chars`)
    #[serde(default)]
    pub max_context_chars: Option<usize>,

    /// Minimum similarity score (default: config `retrieval.min_score`)
    #[serde(default)]
    pub min_score: Option<f32>,
}

impl QueryRequest {
    /// Create a new query with config defaults
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
            temperatures: None,
            max_context_chars: None,
            min_score: None,
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Set the temperature list
    pub fn with_temperatures(mut self, temperatures: Vec<f32>) -> Self {
        self.temperatures = Some(temperatures);
        self
    }

    /// Set the context character budget
    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = Some(max_context_chars);
        self
    }
}
