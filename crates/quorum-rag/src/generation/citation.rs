//! Citation extraction and validation
//!
//! Markers are parsed best-effort out of free-form generated text and every
//! one is validated against the retrieval context the answer was generated
//! from - never against the whole index, and never trusted at face value.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::retrieval::RetrievalContext;
use crate::types::{ChunkId, Citation, UnverifiedCitation};

/// `[chunk:<document-uuid>#<index>]`
fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[chunk:\s*([0-9a-fA-F-]{36}#\d+)\s*\]").expect("Invalid regex")
    })
}

/// Result of resolving one candidate's citations
#[derive(Debug, Clone)]
pub struct ResolvedAnswer {
    /// Answer text with verified markers rewritten to `[n]` footnotes and
    /// unverified markers stripped
    pub text: String,
    /// Verified citations in footnote order
    pub citations: Vec<Citation>,
    /// Markers that did not resolve to a chunk in the context
    pub unverified: Vec<UnverifiedCitation>,
}

/// Resolve citation markers in generated text against the supplied context.
///
/// A marker that parses but names a chunk outside the context is a contract
/// violation by the generator: it is recorded as unverified and excluded
/// from the citation set, never silently dropped and never looked up
/// elsewhere. Text without any parseable markers resolves to zero citations.
pub fn resolve(candidate_text: &str, context: &RetrievalContext) -> ResolvedAnswer {
    let mut citations: Vec<Citation> = Vec::new();
    let mut unverified: Vec<UnverifiedCitation> = Vec::new();
    // chunk id -> footnote number, first appearance wins
    let mut footnotes: HashMap<ChunkId, usize> = HashMap::new();

    for cap in marker_regex().captures_iter(candidate_text) {
        let marker = cap.get(0).map(|m| m.as_str()).unwrap_or("");
        let id_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");

        let Some(chunk_id) = ChunkId::parse(id_str) else {
            unverified.push(UnverifiedCitation {
                marker: marker.to_string(),
                reason: "malformed chunk id".to_string(),
            });
            continue;
        };

        if footnotes.contains_key(&chunk_id) {
            continue;
        }

        match context.get(&chunk_id) {
            Some(entry) => {
                let number = citations.len() + 1;
                footnotes.insert(chunk_id.clone(), number);
                citations.push(Citation {
                    marker: marker.to_string(),
                    chunk_id,
                    document_id: entry.metadata.document_id,
                    filename: entry.metadata.filename.clone(),
                    provenance: entry.metadata.provenance.clone(),
                    excerpt: entry.metadata.excerpt.clone(),
                });
            }
            None => {
                if !unverified.iter().any(|u| u.marker == marker) {
                    unverified.push(UnverifiedCitation {
                        marker: marker.to_string(),
                        reason: "chunk not present in the retrieval context".to_string(),
                    });
                }
            }
        }
    }

    // Rewrite verified markers to numbered footnotes, strip the rest
    let text = marker_regex()
        .replace_all(candidate_text, |cap: &regex::Captures| {
            let id_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            match ChunkId::parse(id_str).and_then(|id| footnotes.get(&id).copied()) {
                Some(number) => format!("[{}]", number),
                None => String::new(),
            }
        })
        .to_string();

    // Collapse doubled spaces left behind by stripped markers
    let text = text.replace("  ", " ").trim().to_string();

    ResolvedAnswer {
        text,
        citations,
        unverified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, IndexMatch, Provenance};
    use uuid::Uuid;

    fn context_with(doc: Uuid, indices: &[u32]) -> RetrievalContext {
        let matches = indices
            .iter()
            .map(|&i| IndexMatch {
                chunk_id: ChunkId::new(doc, i),
                metadata: ChunkMetadata {
                    document_id: doc,
                    filename: "contract.pdf".to_string(),
                    chunk_index: i,
                    excerpt: format!("excerpt {}", i),
                    provenance: Provenance::Page { number: i + 1 },
                },
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        RetrievalContext::assemble(matches, -1.0, 100_000)
    }

    #[test]
    fn verified_markers_become_footnotes() {
        let doc = Uuid::new_v4();
        let context = context_with(doc, &[0, 1]);
        let text = format!(
            "The fee is 40 euros. [chunk:{doc}#0] It renews yearly. [chunk:{doc}#1]"
        );

        let resolved = resolve(&text, &context);

        assert_eq!(resolved.citations.len(), 2);
        assert!(resolved.unverified.is_empty());
        assert!(resolved.text.contains("[1]"));
        assert!(resolved.text.contains("[2]"));
        assert!(!resolved.text.contains("chunk:"));
        assert_eq!(resolved.citations[0].chunk_id, ChunkId::new(doc, 0));
        assert_eq!(resolved.citations[0].excerpt, "excerpt 0");
    }

    #[test]
    fn marker_outside_context_is_unverified_and_excluded() {
        let doc = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let context = context_with(doc, &[0]);
        let text = format!("Claim. [chunk:{stranger}#5]");

        let resolved = resolve(&text, &context);

        assert!(resolved.citations.is_empty());
        assert_eq!(resolved.unverified.len(), 1);
        assert!(resolved.unverified[0].marker.contains(&stranger.to_string()));
        // The bogus marker is stripped from the cleaned text
        assert!(!resolved.text.contains("chunk:"));
    }

    #[test]
    fn repeated_marker_cites_once() {
        let doc = Uuid::new_v4();
        let context = context_with(doc, &[0]);
        let text = format!("A. [chunk:{doc}#0] B. [chunk:{doc}#0]");

        let resolved = resolve(&text, &context);

        assert_eq!(resolved.citations.len(), 1);
        // Both occurrences point at the same footnote
        assert_eq!(resolved.text.matches("[1]").count(), 2);
    }

    #[test]
    fn text_without_markers_resolves_to_zero_citations() {
        let context = context_with(Uuid::new_v4(), &[0]);
        let resolved = resolve("No relevant information was found.", &context);
        assert!(resolved.citations.is_empty());
        assert!(resolved.unverified.is_empty());
        assert_eq!(resolved.text, "No relevant information was found.");
    }

    #[test]
    fn malformed_markers_are_ignored_not_fatal() {
        let context = context_with(Uuid::new_v4(), &[0]);
        let resolved = resolve("Odd output [chunk:not-a-uuid#0] trailing.", &context);
        assert!(resolved.citations.is_empty());
        // The malformed token does not match the marker shape, so it stays
        assert!(resolved.text.contains("[chunk:not-a-uuid#0]"));
    }
}
