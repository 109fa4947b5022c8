//! Ingestion pipeline: load -> chunk -> embed -> index
//!
//! One idempotent operation per uploaded batch. Documents are independent,
//! so files are processed concurrently under a bounded worker pool, and one
//! file's failure never aborts its siblings.

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, RetryPolicy, VectorIndexProvider};
use crate::types::{
    ChunkMetadata, Document, DocumentFormat, DocumentSummary, FailureKind, FileOutcome,
    IndexEntry, IngestReport,
};

use super::chunker::TextChunker;
use super::loader::DocumentLoader;

/// One file of an upload batch
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Filename as uploaded
    pub filename: String,
    /// Declared mime type
    pub mime_type: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

/// Ingestion pipeline composing loader, chunker, embedding gateway and
/// vector index
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    batch_size: usize,
    parallel_files: usize,
    file_timeout: Duration,
    retry: RetryPolicy,
}

impl IngestPipeline {
    /// Create a pipeline from configuration and providers.
    ///
    /// Fails fast on invalid chunking parameters: a misconfigured deployment
    /// is not a per-file condition.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.max_chars, config.chunking.overlap_chars)?;
        Ok(Self {
            chunker,
            embedder,
            index,
            batch_size: config.embeddings.batch_size.max(1),
            parallel_files: config.processing.effective_parallel_files(),
            file_timeout: Duration::from_secs(config.processing.file_timeout_secs),
            retry: RetryPolicy::new(config.llm.max_retries),
        })
    }

    /// Ingest a batch of files, returning every file's outcome in
    /// submission order.
    pub async fn ingest(&self, files: Vec<FileUpload>) -> IngestReport {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallel_files));

        let futures: Vec<_> = files
            .into_iter()
            .map(|file| {
                let sem = semaphore.clone();
                async move {
                    let _permit = sem.acquire().await.expect("semaphore closed");
                    let filename = file.filename.clone();
                    let file_start = Instant::now();

                    let result = match timeout(self.file_timeout, self.ingest_file(file)).await {
                        Ok(result) => result,
                        Err(_) => {
                            tracing::error!(
                                "Timeout processing '{}' after {:.1}s (limit {}s)",
                                filename,
                                file_start.elapsed().as_secs_f64(),
                                self.file_timeout.as_secs()
                            );
                            return FileOutcome::Failed {
                                filename,
                                kind: FailureKind::Timeout,
                                error: format!(
                                    "processing timeout after {}s",
                                    self.file_timeout.as_secs()
                                ),
                            };
                        }
                    };

                    match result {
                        Ok((document, chunks_indexed)) => {
                            tracing::info!(
                                "Ingested '{}': {} chunks in {:.1}s",
                                document.filename,
                                chunks_indexed,
                                file_start.elapsed().as_secs_f64()
                            );
                            FileOutcome::Ingested {
                                document: DocumentSummary::from(&document),
                                chunks_indexed,
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to ingest '{}': {}", filename, e);
                            FileOutcome::Failed {
                                filename,
                                kind: FailureKind::from(&e),
                                error: e.to_string(),
                            }
                        }
                    }
                }
            })
            .collect();

        let outcomes = join_all(futures).await;
        IngestReport::new(outcomes, start.elapsed().as_millis() as u64)
    }

    /// Ingest one file: parse, chunk, embed, replace index entries.
    ///
    /// Returns the document record and the number of chunks indexed. The
    /// document's previous index entries are deleted only after embedding
    /// succeeded, so a failed re-ingest leaves the old entries intact.
    pub async fn ingest_file(&self, file: FileUpload) -> Result<(Document, u32)> {
        let FileUpload {
            filename,
            mime_type,
            bytes,
        } = file;

        let format = DocumentFormat::detect(&filename, &mime_type)
            .ok_or_else(|| Error::unsupported_format(&filename, &mime_type))?;

        let segments = DocumentLoader::load(&filename, &mime_type, &bytes)?;

        let mut document = Document::new(filename.clone(), mime_type, format, &bytes);
        let chunks = self.chunker.chunk_document(document.id, &segments);

        if chunks.is_empty() {
            return Err(Error::corrupt_document(&filename, "document produced no chunks"));
        }

        tracing::debug!("'{}': {} segments, {} chunks", filename, segments.len(), chunks.len());

        // Embed in provider-sized batches; transient failures are retried
        // with backoff before the file is declared failed
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_vectors = self
                .retry
                .run("embedding batch", || self.embedder.embed_batch(&texts))
                .await?;
            if batch_vectors.len() != texts.len() {
                return Err(Error::embedding(format!(
                    "provider returned {} vectors for {} inputs",
                    batch_vectors.len(),
                    texts.len()
                )));
            }
            vectors.extend(batch_vectors);
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                chunk_id: chunk.id.clone(),
                vector,
                metadata: ChunkMetadata::from_chunk(chunk, &document.filename),
            })
            .collect();

        // Replace, not merge: clear the document's old entries, then upsert.
        // Chunk ids are stable, so even a crash between the two steps cannot
        // leave duplicates, only a rerunnable gap.
        let deleted = self
            .retry
            .run("index delete", || self.index.delete_by_document(&document.id))
            .await?;
        if deleted > 0 {
            tracing::info!("Replaced {} existing chunks for '{}'", deleted, document.filename);
        }

        let entry_count = entries.len() as u32;
        self.retry
            .run("index upsert", || {
                let entries = entries.clone();
                async move { self.index.upsert(entries).await }
            })
            .await?;

        document.total_chunks = entry_count;
        Ok((document, entry_count))
    }
}
