//! Generation provider trait for LLM-backed answer drafting

use async_trait::async_trait;

use crate::error::Result;

/// Capability interface to a text-generation service.
///
/// Implementations:
/// - `OllamaClient`: Ollama HTTP server
///
/// Calls are never retried by the engine: a regenerated stochastic answer is
/// a new candidate, not a repair of a failed one.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the prompt at the given sampling temperature
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// The model being used
    fn model(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &str;
}
