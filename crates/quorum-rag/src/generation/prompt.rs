//! Prompt templates for grounded multi-candidate generation

use crate::retrieval::RetrievalContext;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render the retrieved context as numbered blocks, each headed by the
    /// citation marker the model must use to reference it
    pub fn build_context(context: &RetrievalContext) -> String {
        let mut out = String::new();

        for (i, entry) in context.entries().iter().enumerate() {
            let mut source_ref = entry.metadata.filename.clone();
            if let Some(loc) = entry.metadata.provenance.describe() {
                source_ref.push_str(", ");
                source_ref.push_str(&loc);
            }

            out.push_str(&format!(
                "[{}] marker: [chunk:{}] ({})\n\n{}\n\n---\n\n",
                i + 1,
                entry.chunk_id,
                source_ref,
                entry.metadata.excerpt
            ));
        }

        out
    }

    /// Build the full grounded prompt for one query.
    ///
    /// With an empty context this degrades to the no-grounding variant: the
    /// model is told to state that nothing relevant was found, never to
    /// answer from general knowledge.
    pub fn build(question: &str, context: &RetrievalContext) -> String {
        if context.is_empty() {
            return Self::build_no_context(question);
        }

        format!(
            r#"You are a document-grounded assistant that ONLY uses information from provided documents.

CRITICAL GROUNDING RULES - YOU MUST FOLLOW THESE EXACTLY:
1. ONLY use information that is EXPLICITLY stated in the CONTEXT below
2. If the answer is not in the context, respond with "This information is not available in the provided documents."
3. NEVER use external knowledge, general knowledge, or training data
4. Every factual claim MUST be followed by the citation marker of the chunk it came from, copied verbatim from the context below
5. Only use markers that appear in the context below; never invent markers
6. Do NOT paraphrase in ways that change meaning - stay close to the source text

RESPONSE STRUCTURE:
ANSWER: a clear answer with an inline citation marker after each claim
REASONING: a short step-by-step explanation of how the context supports the answer

CONTEXT FROM DOCUMENTS:
{context}

QUESTION: {question}

Respond now using the ANSWER/REASONING structure:"#,
            context = Self::build_context(context),
            question = question,
        )
    }

    /// Prompt variant for an empty context
    fn build_no_context(question: &str) -> String {
        format!(
            r#"You are a document-grounded assistant. The user asked a question, but no relevant information was found in their uploaded documents.

RESPONSE STRUCTURE:
ANSWER: state clearly that no relevant information was found in the provided documents; do not answer from general knowledge
REASONING: state that the document search returned nothing relevant

QUESTION: {question}

Respond now using the ANSWER/REASONING structure:"#,
            question = question,
        )
    }

    /// Split a raw completion into answer and optional reasoning.
    ///
    /// Best-effort: the generator is not contractually obligated to follow
    /// the structure, so a missing REASONING section simply yields `None`
    /// and an absent ANSWER heading leaves the text as-is.
    pub fn split_answer_reasoning(raw: &str) -> (String, Option<String>) {
        let trimmed = raw.trim();

        let (answer_part, reasoning_part) = match find_heading(trimmed, "REASONING:") {
            Some(pos) => {
                let (a, r) = trimmed.split_at(pos);
                (a, Some(r["REASONING:".len()..].trim().to_string()))
            }
            None => (trimmed, None),
        };

        let answer = answer_part
            .trim()
            .strip_prefix("ANSWER:")
            .unwrap_or(answer_part.trim())
            .trim()
            .to_string();

        let reasoning = reasoning_part.filter(|r| !r.is_empty());
        (answer, reasoning)
    }
}

/// Find a heading at a line start, case-sensitive
fn find_heading(text: &str, heading: &str) -> Option<usize> {
    if text.starts_with(heading) {
        return Some(0);
    }
    text.find(&format!("\n{}", heading)).map(|pos| pos + 1)
}
