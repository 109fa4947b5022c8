//! End-to-end pipeline tests over in-process providers: deterministic hash
//! embeddings, the in-memory vector index, and scripted generation.

use std::sync::Arc;

use async_trait::async_trait;
use quorum_rag::config::RagConfig;
use quorum_rag::error::{Error, Result};
use quorum_rag::generation::GenerationEngine;
use quorum_rag::ingestion::{FileUpload, IngestPipeline};
use quorum_rag::providers::{
    EmbeddingProvider, GenerationProvider, HashEmbedder, MemoryVectorIndex, VectorIndexProvider,
};
use quorum_rag::retrieval::RetrievalEngine;
use quorum_rag::types::{CandidateOutcome, Document, FailureKind, FileOutcome};

/// Generator that answers with the excerpt of the first cited chunk in the
/// prompt, citing it; without grounding it reports that nothing was found.
struct EchoGenerator;

#[async_trait]
impl GenerationProvider for EchoGenerator {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let marker_re = regex::Regex::new(r"\[chunk:[0-9a-f-]{36}#\d+\]").unwrap();

        // Quote every context block with its own marker, as a thorough
        // grounded model would
        let context_section = prompt
            .split("CONTEXT FROM DOCUMENTS:")
            .nth(1)
            .and_then(|s| s.split("QUESTION:").next())
            .unwrap_or("");

        let mut claims = Vec::new();
        for block in context_section.split("---") {
            if let Some(marker) = marker_re.find(block) {
                let excerpt: String = block
                    .lines()
                    .filter(|l| !l.trim().is_empty() && !l.contains("marker:"))
                    .collect::<Vec<_>>()
                    .join(" ");
                claims.push(format!("{} {}", excerpt.trim(), marker.as_str()));
            }
        }

        Ok(if claims.is_empty() {
            "ANSWER: No relevant information was found in the provided documents.\n\
             REASONING: The document search returned nothing relevant."
                .to_string()
        } else {
            format!(
                "ANSWER: {}\nREASONING: Each cited chunk states its claim directly.",
                claims.join(" ")
            )
        })
    }

    fn model(&self) -> &str {
        "echo"
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Generator that fails at one specific temperature
struct FlakyGenerator {
    fail_at: f32,
}

#[async_trait]
impl GenerationProvider for FlakyGenerator {
    async fn complete(&self, _prompt: &str, temperature: f32) -> Result<String> {
        if (temperature - self.fail_at).abs() < f32::EPSILON {
            Err(Error::generation(temperature, "provider unavailable"))
        } else {
            Ok("ANSWER: Fine.".to_string())
        }
    }

    fn model(&self) -> &str {
        "flaky"
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

struct Harness {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
}

impl Harness {
    fn new() -> Self {
        let mut config = RagConfig::default();
        config.chunking.max_chars = 200;
        config.chunking.overlap_chars = 40;
        config.llm.max_retries = 0;

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(256));
        let index: Arc<dyn VectorIndexProvider> = Arc::new(MemoryVectorIndex::new(256));

        Self {
            config,
            embedder,
            index,
        }
    }

    fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(&self.config, self.embedder.clone(), self.index.clone()).unwrap()
    }

    fn retrieval(&self) -> RetrievalEngine {
        RetrievalEngine::new(&self.config, self.embedder.clone(), self.index.clone())
    }

    fn generation(&self, provider: Arc<dyn GenerationProvider>) -> GenerationEngine {
        GenerationEngine::new(&self.config, provider)
    }
}

fn text_file(filename: &str, content: &str) -> FileUpload {
    FileUpload {
        filename: filename.to_string(),
        mime_type: "text/plain".to_string(),
        bytes: content.as_bytes().to_vec(),
    }
}

const WARRANTY_DOC: &str = "This agreement covers the purchased appliance. \
The warranty period is 24 months. Repairs during the warranty period are \
free of charge when the defect is not caused by misuse. Shipping costs for \
warranty returns are carried by the vendor.";

#[tokio::test]
async fn ingested_document_is_retrievable() {
    let harness = Harness::new();
    let report = harness
        .pipeline()
        .ingest(vec![text_file("warranty.txt", WARRANTY_DOC)])
        .await;

    assert_eq!(report.summary.ingested, 1);
    assert_eq!(report.summary.failed, 0);
    assert!(report.summary.chunks_indexed >= 1);

    let context = harness
        .retrieval()
        .retrieve("How long is the warranty?", 3, 10_000)
        .await
        .unwrap();

    assert!(!context.is_empty());
    let doc_id = Document::derive_id("warranty.txt");
    assert!(context
        .entries()
        .iter()
        .any(|e| e.metadata.document_id == doc_id));
    assert!(context
        .entries()
        .iter()
        .any(|e| e.metadata.excerpt.contains("24 months")));
}

#[tokio::test]
async fn reingest_leaves_exactly_one_set_of_entries() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let first = pipeline
        .ingest(vec![text_file("warranty.txt", WARRANTY_DOC)])
        .await;
    let count_after_first = harness.index.len().await.unwrap();
    assert_eq!(first.summary.ingested, 1);
    assert!(count_after_first >= 1);

    let second = pipeline
        .ingest(vec![text_file("warranty.txt", WARRANTY_DOC)])
        .await;
    let count_after_second = harness.index.len().await.unwrap();
    assert_eq!(second.summary.ingested, 1);

    assert_eq!(count_after_first, count_after_second);
}

#[tokio::test]
async fn unsupported_file_fails_alone_while_sibling_succeeds() {
    let harness = Harness::new();
    let report = harness
        .pipeline()
        .ingest(vec![
            FileUpload {
                filename: "photo.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            },
            text_file("notes.txt", "Plain notes about the project schedule."),
        ])
        .await;

    assert_eq!(report.files.len(), 2);
    match &report.files[0] {
        FileOutcome::Failed { filename, kind, .. } => {
            assert_eq!(filename, "photo.png");
            assert_eq!(*kind, FailureKind::UnsupportedFormat);
        }
        other => panic!("expected a failure for photo.png, got {:?}", other),
    }
    assert!(report.files[1].is_success());
    assert_eq!(report.summary.ingested, 1);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn corrupt_file_is_classified_as_corrupt() {
    let harness = Harness::new();
    let report = harness
        .pipeline()
        .ingest(vec![FileUpload {
            filename: "broken.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: b"this is not a pdf".to_vec(),
        }])
        .await;

    match &report.files[0] {
        FileOutcome::Failed { kind, .. } => assert_eq!(*kind, FailureKind::CorruptDocument),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn warranty_scenario_end_to_end() {
    let harness = Harness::new();
    harness
        .pipeline()
        .ingest(vec![text_file("warranty.txt", WARRANTY_DOC)])
        .await;

    let context = harness
        .retrieval()
        .retrieve("How long is the warranty?", 3, 10_000)
        .await
        .unwrap();
    assert!(!context.is_empty());

    let candidates = harness
        .generation(Arc::new(EchoGenerator))
        .generate("How long is the warranty?", &context, &[0.2, 0.7, 1.0])
        .await;

    assert_eq!(candidates.len(), 3);

    let mut cited_answers = 0;
    for candidate in &candidates {
        if let CandidateOutcome::Answer {
            text, citations, ..
        } = &candidate.outcome
        {
            if text.contains("24 months") && !citations.is_empty() {
                // Every citation must point into the context that produced it
                for citation in citations {
                    assert!(context.get(&citation.chunk_id).is_some());
                }
                cited_answers += 1;
            }
        }
    }
    assert!(cited_answers >= 1, "no candidate cited the warranty chunk");
}

#[tokio::test]
async fn empty_index_query_reports_no_information() {
    let harness = Harness::new();

    let context = harness
        .retrieval()
        .retrieve("What is the refund policy?", 5, 10_000)
        .await
        .unwrap();
    assert!(context.is_empty());

    let candidates = harness
        .generation(Arc::new(EchoGenerator))
        .generate("What is the refund policy?", &context, &[0.2, 0.7])
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

#[tokio::test]
async fn failed_candidate_does_not_sink_the_request() {
    let harness = Harness::new();
    harness
        .pipeline()
        .ingest(vec![text_file("notes.txt", "The meeting is on Thursday.")])
        .await;

    let context = harness
        .retrieval()
        .retrieve("When is the meeting?", 3, 10_000)
        .await
        .unwrap();

    let candidates = harness
        .generation(Arc::new(FlakyGenerator { fail_at: 0.7 }))
        .generate("When is the meeting?", &context, &[0.2, 0.7, 1.0])
        .await;

    assert_eq!(candidates.len(), 3);
    assert!(candidates[0].is_answer());
    match &candidates[1].outcome {
        CandidateOutcome::Failed { error } => assert!(error.contains("provider unavailable")),
        other => panic!("expected failure at 0.7, got {:?}", other),
    }
    assert!(candidates[2].is_answer());
}

#[tokio::test]
async fn csv_upload_round_trips_with_row_provenance() {
    let harness = Harness::new();
    let csv = "part,price\nwidget,19\ngadget,42\n";
    let report = harness
        .pipeline()
        .ingest(vec![FileUpload {
            filename: "parts.csv".to_string(),
            mime_type: "text/csv".to_string(),
            bytes: csv.as_bytes().to_vec(),
        }])
        .await;
    assert_eq!(report.summary.ingested, 1);

    let context = harness
        .retrieval()
        .retrieve("price of the gadget part", 3, 10_000)
        .await
        .unwrap();

    assert!(!context.is_empty());
    assert!(context
        .entries()
        .iter()
        .any(|e| e.metadata.excerpt.contains("gadget | 42")));
}
