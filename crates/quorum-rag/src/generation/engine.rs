//! Multi-candidate generation engine
//!
//! One independent generation call per requested temperature, run
//! concurrently and joined in input order. A failed call costs exactly its
//! own candidate slot; siblings are unaffected, and nothing is retried.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::RagConfig;
use crate::providers::GenerationProvider;
use crate::retrieval::RetrievalContext;
use crate::types::{Candidate, CandidateOutcome};

use super::citation;
use super::prompt::PromptBuilder;

/// Generation engine producing one candidate per temperature
pub struct GenerationEngine {
    provider: Arc<dyn GenerationProvider>,
    call_timeout: Duration,
}

impl GenerationEngine {
    /// Create an engine from configuration and a provider
    pub fn new(config: &RagConfig, provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            call_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }

    /// Generate candidates for a question against a retrieval context.
    ///
    /// Returns exactly `temperatures.len()` candidates in input order,
    /// duplicates included (generation is stochastic, so duplicate
    /// temperatures produce independent candidates). Cancellation propagates
    /// naturally: dropping the returned future aborts every in-flight call.
    pub async fn generate(
        &self,
        question: &str,
        context: &RetrievalContext,
        temperatures: &[f32],
    ) -> Vec<Candidate> {
        let prompt = PromptBuilder::build(question, context);

        let futures: Vec<_> = temperatures
            .iter()
            .map(|&temperature| {
                let prompt = prompt.as_str();
                async move {
                    match timeout(self.call_timeout, self.provider.complete(prompt, temperature))
                        .await
                    {
                        Ok(Ok(raw)) => self.resolve_candidate(raw, temperature, context),
                        Ok(Err(e)) => {
                            tracing::warn!(
                                "Generation failed at temperature {}: {}",
                                temperature,
                                e
                            );
                            Candidate {
                                temperature,
                                outcome: CandidateOutcome::Failed { error: e.to_string() },
                            }
                        }
                        Err(_) => {
                            tracing::warn!(
                                "Generation timed out at temperature {} after {}s",
                                temperature,
                                self.call_timeout.as_secs()
                            );
                            Candidate {
                                temperature,
                                outcome: CandidateOutcome::Failed {
                                    error: format!(
                                        "generation timeout after {}s",
                                        self.call_timeout.as_secs()
                                    ),
                                },
                            }
                        }
                    }
                }
            })
            .collect();

        join_all(futures).await
    }

    /// Turn one raw completion into an answer candidate with verified
    /// citations
    fn resolve_candidate(
        &self,
        raw: String,
        temperature: f32,
        context: &RetrievalContext,
    ) -> Candidate {
        let (answer, reasoning) = PromptBuilder::split_answer_reasoning(&raw);
        let resolved = citation::resolve(&answer, context);

        if !resolved.unverified.is_empty() {
            tracing::warn!(
                "Candidate at temperature {} cited {} marker(s) outside its context",
                temperature,
                resolved.unverified.len()
            );
        }

        Candidate {
            temperature,
            outcome: CandidateOutcome::Answer {
                text: resolved.text,
                reasoning,
                citations: resolved.citations,
                unverified_citations: resolved.unverified,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::{ChunkId, ChunkMetadata, IndexMatch, Provenance};
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Echoes the first citation marker found in the prompt; fails at a
    /// chosen temperature
    struct ScriptedProvider {
        fail_at: Option<f32>,
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
            if let Some(fail_at) = self.fail_at {
                if (temperature - fail_at).abs() < f32::EPSILON {
                    return Err(Error::generation(temperature, "scripted failure"));
                }
            }
            let context_section = prompt
                .split("CONTEXT FROM DOCUMENTS:")
                .nth(1)
                .unwrap_or("");
            let marker = regex::Regex::new(r"\[chunk:[0-9a-f-]{36}#\d+\]")
                .unwrap()
                .find(context_section)
                .map(|m| m.as_str().to_string());
            Ok(match marker {
                Some(marker) => format!(
                    "ANSWER: Grounded claim. {}\nREASONING: The context says so.",
                    marker
                ),
                None => "ANSWER: No relevant information was found in the provided documents."
                    .to_string(),
            })
        }

        fn model(&self) -> &str {
            "scripted"
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn engine(fail_at: Option<f32>) -> GenerationEngine {
        GenerationEngine::new(
            &RagConfig::default(),
            Arc::new(ScriptedProvider { fail_at }),
        )
    }

    fn one_chunk_context() -> RetrievalContext {
        let doc = Uuid::new_v4();
        RetrievalContext::assemble(
            vec![IndexMatch {
                chunk_id: ChunkId::new(doc, 0),
                metadata: ChunkMetadata {
                    document_id: doc,
                    filename: "contract.pdf".to_string(),
                    chunk_index: 0,
                    excerpt: "The warranty period is 24 months.".to_string(),
                    provenance: Provenance::Page { number: 1 },
                },
                score: 0.95,
            }],
            -1.0,
            10_000,
        )
    }

    #[tokio::test]
    async fn one_candidate_per_temperature_in_input_order() {
        let context = one_chunk_context();
        let candidates = engine(None)
            .generate("How long is the warranty?", &context, &[0.2, 0.7, 1.0])
            .await;

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].temperature, 0.2);
        assert_eq!(candidates[1].temperature, 0.7);
        assert_eq!(candidates[2].temperature, 1.0);
        assert!(candidates.iter().all(|c| c.is_answer()));
    }

    #[tokio::test]
    async fn failed_temperature_keeps_its_slot_while_siblings_succeed() {
        let context = one_chunk_context();
        let candidates = engine(Some(0.7))
            .generate("How long is the warranty?", &context, &[0.2, 0.7, 1.0])
            .await;

        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].is_answer());
        assert!(matches!(
            candidates[1].outcome,
            CandidateOutcome::Failed { .. }
        ));
        assert_eq!(candidates[1].temperature, 0.7);
        assert!(candidates[2].is_answer());
    }

    #[tokio::test]
    async fn duplicate_temperatures_produce_independent_candidates() {
        let context = one_chunk_context();
        let candidates = engine(None)
            .generate("Question?", &context, &[0.5, 0.5])
            .await;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].temperature, 0.5);
        assert_eq!(candidates[1].temperature, 0.5);
    }

    #[tokio::test]
    async fn answers_carry_verified_citations() {
        let context = one_chunk_context();
        let candidates = engine(None)
            .generate("How long is the warranty?", &context, &[0.2])
            .await;

        match &candidates[0].outcome {
            CandidateOutcome::Answer {
                citations,
                reasoning,
                unverified_citations,
                ..
            } => {
                assert_eq!(citations.len(), 1);
                assert_eq!(citations[0].chunk_id, context.entries()[0].chunk_id);
                assert!(reasoning.is_some());
                assert!(unverified_citations.is_empty());
            }
            other => panic!("expected an answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_context_yields_no_information_answers() {
        let candidates = engine(None)
            .generate("Anything?", &RetrievalContext::empty(), &[0.2, 0.7])
            .await;

        assert_eq!(candidates.len(), 2);
        for candidate in &candidates {
            match &candidate.outcome {
                CandidateOutcome::Answer { text, citations, .. } => {
                    assert!(text.contains("No relevant information"));
                    assert!(citations.is_empty());
                }
                other => panic!("expected an answer, got {:?}", other),
            }
        }
    }
}
