/*!
 * Sequential document pipeline.
 *
 * For each document: skip it if its output already exists, read it, chunk
 * it, translate the chunks one by one through the gateway with a pacing
 * pause after every service call, join the results in chunk order and hand
 * the full text to the store in a single write.
 *
 * Chunk failures never reach this level; they arrive as degraded results.
 * Only I/O and session errors fail a document, and even those do not stop
 * the batch.
 */

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::providers::TranslatorFactory;

use super::chunker::{ChunkPolicy, Chunker};
use super::gateway::{ChunkOutcome, RetryPolicy, TranslationResult, TranslatorGateway};

/// A transcript waiting to be translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptDocument {
    /// Stable identifier, the file stem (e.g. `ep004_raw`)
    pub identifier: String,
    /// Where the raw text lives
    pub source_path: PathBuf,
}

/// Input and output collaborator of the pipeline
pub trait DocumentStore {
    /// Whether the document already has an output artifact
    fn is_done(&self, document: &TranscriptDocument) -> bool;

    /// Read the raw text of a document
    fn read_raw(&self, document: &TranscriptDocument) -> Result<String>;

    /// Persist the fully assembled translation, returning where it went
    fn persist(&self, document: &TranscriptDocument, text: &str) -> Result<PathBuf>;
}

/// Pause inserted after each chunk that reached the service
///
/// Applied whether the chunk was translated or degraded. Blank chunks never
/// call the service and are not followed by a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    base: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Base delay plus a random share of the jitter
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let extra_ms = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        self.base + Duration::from_millis(extra_ms)
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Everything the driver needs besides its collaborators
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_policy: ChunkPolicy,
    pub max_chunk_len: usize,
    pub separator: String,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    pub source_language: String,
    pub target_language: String,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        let common = &config.translation.common;
        Self {
            chunk_policy: config.chunking.policy,
            max_chunk_len: config.chunking.max_chunk_len,
            separator: config.chunking.separator.clone(),
            retry: RetryPolicy::from_config(common),
            pacing: Pacing::new(
                Duration::from_millis(common.inter_call_delay_ms),
                Duration::from_millis(common.inter_call_jitter_ms),
            ),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where a document is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    Pending,
    Chunking,
    /// `chunk` is 1-based
    Translating { chunk: usize, of: usize },
    Assembled,
    Persisted,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Chunking => write!(f, "chunking"),
            Self::Translating { chunk, of } => write!(f, "translating chunk {}/{}", chunk, of),
            Self::Assembled => write!(f, "assembled"),
            Self::Persisted => write!(f, "persisted"),
        }
    }
}

/// Progress notifications emitted while a batch runs
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    DocumentStarted { identifier: &'a str, position: usize, total: usize },
    StateChanged { identifier: &'a str, state: DocumentState },
    DocumentFinished { identifier: &'a str },
}

/// A chunk that came back empty after all attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedChunk {
    /// 0-based chunk index
    pub index: usize,
    pub attempts: u32,
    pub error: String,
}

/// Per-document statistics for a translated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub identifier: String,
    pub output_path: PathBuf,
    pub chunks: usize,
    pub translated: usize,
    pub blank: usize,
    pub degraded: Vec<DegradedChunk>,
}

/// How a document left the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Translated and persisted (possibly with degraded chunks)
    Translated(DocumentReport),
    /// Output already existed; nothing was done
    AlreadyProcessed,
    /// No usable text; nothing was written
    EmptyInput,
}

/// Totals for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped_existing: usize,
    pub skipped_empty: usize,
    pub failed: usize,
    pub chunks_translated: usize,
    pub chunks_degraded: usize,
    /// Translated documents that had at least one degraded chunk
    pub reports_with_degraded: Vec<DocumentReport>,
}

impl BatchSummary {
    fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Translated(report) => {
                self.processed += 1;
                self.chunks_translated += report.translated;
                self.chunks_degraded += report.degraded.len();
                if !report.degraded.is_empty() {
                    self.reports_with_degraded.push(report.clone());
                }
            }
            DocumentOutcome::AlreadyProcessed => self.skipped_existing += 1,
            DocumentOutcome::EmptyInput => self.skipped_empty += 1,
        }
    }

    /// 0 unless a document failed outright; degraded chunks do not count
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} already done, {} empty, {} failed; {} chunks translated, {} degraded",
            self.processed,
            self.skipped_existing,
            self.skipped_empty,
            self.failed,
            self.chunks_translated,
            self.chunks_degraded
        )
    }
}

/// Drives documents through chunking, translation and persistence
pub struct PipelineDriver<'f> {
    options: PipelineOptions,
    factory: &'f dyn TranslatorFactory,
}

impl<'f> PipelineDriver<'f> {
    pub fn new(options: PipelineOptions, factory: &'f dyn TranslatorFactory) -> Self {
        Self { options, factory }
    }

    /// Process every document in order; never stops early
    pub async fn run(
        &self,
        store: &dyn DocumentStore,
        documents: &[TranscriptDocument],
        observer: &dyn Fn(PipelineEvent<'_>),
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = documents.len();

        for (position, document) in documents.iter().enumerate() {
            observer(PipelineEvent::DocumentStarted {
                identifier: &document.identifier,
                position: position + 1,
                total,
            });

            match self.process_document(store, document, observer).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Failed to process {}: {:#}", document.identifier, e);
                    summary.failed += 1;
                }
            }

            observer(PipelineEvent::DocumentFinished {
                identifier: &document.identifier,
            });
        }

        summary
    }

    /// Take one document from pending to persisted
    pub async fn process_document(
        &self,
        store: &dyn DocumentStore,
        document: &TranscriptDocument,
        observer: &dyn Fn(PipelineEvent<'_>),
    ) -> Result<DocumentOutcome> {
        let id = document.identifier.as_str();
        let notify = |state: DocumentState| {
            debug!("{}: {}", id, state);
            observer(PipelineEvent::StateChanged { identifier: id, state });
        };
        notify(DocumentState::Pending);

        if store.is_done(document) {
            info!("Skipping {}, output already exists", id);
            return Ok(DocumentOutcome::AlreadyProcessed);
        }

        let raw = store.read_raw(document)?;
        if raw.trim().is_empty() {
            info!("Skipping {}, no text to translate", id);
            return Ok(DocumentOutcome::EmptyInput);
        }

        notify(DocumentState::Chunking);
        let chunks = Chunker::new(self.options.chunk_policy, self.options.max_chunk_len).chunk(&raw);
        info!(
            "{}: {} chars -> {} chunk(s)",
            id,
            raw.chars().count(),
            chunks.len()
        );

        // Session lives exactly as long as this document
        let session = self
            .factory
            .open_session()
            .map_err(|source| TranslationError::Session {
                document: id.to_string(),
                source,
            })?;
        let gateway = TranslatorGateway::new(
            session.as_ref(),
            self.options.retry,
            self.options.source_language.clone(),
            self.options.target_language.clone(),
        );

        let total = chunks.len();
        let mut results: Vec<TranslationResult> = Vec::with_capacity(total);
        for chunk in &chunks {
            notify(DocumentState::Translating {
                chunk: chunk.index + 1,
                of: total,
            });
            let result = gateway.translate_chunk(chunk).await;
            let called_service = result.called_service();
            results.push(result);

            if called_service {
                self.options.pacing.wait().await;
            }
        }
        drop(gateway);
        drop(session);

        let report_base = Self::tally(id, &results);
        let assembled = Self::assemble(&results, &self.options.separator);
        notify(DocumentState::Assembled);

        let output_path = store
            .persist(document, &assembled)
            .with_context(|| format!("Failed to persist translation of {}", id))?;
        notify(DocumentState::Persisted);

        if report_base.degraded.is_empty() {
            info!("Saved {} -> {}", id, output_path.display());
        } else {
            warn!(
                "Saved {} -> {} with {} empty chunk(s)",
                id,
                output_path.display(),
                report_base.degraded.len()
            );
        }

        Ok(DocumentOutcome::Translated(DocumentReport {
            output_path,
            ..report_base
        }))
    }

    /// Join results in chunk order
    pub fn assemble(results: &[TranslationResult], separator: &str) -> String {
        let mut ordered: Vec<&TranslationResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.index);
        ordered
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn tally(identifier: &str, results: &[TranslationResult]) -> DocumentReport {
        let mut report = DocumentReport {
            identifier: identifier.to_string(),
            output_path: PathBuf::new(),
            chunks: results.len(),
            translated: 0,
            blank: 0,
            degraded: Vec::new(),
        };

        for result in results {
            match &result.outcome {
                ChunkOutcome::Translated { .. } => report.translated += 1,
                ChunkOutcome::Blank => report.blank += 1,
                ChunkOutcome::Degraded { attempts, last_error } => report.degraded.push(DegradedChunk {
                    index: result.index,
                    attempts: *attempts,
                    error: last_error.clone(),
                }),
            }
        }

        report
    }
}
