/*!
 * Chunked, resilient translation of transcripts.
 *
 * - `chunker`: splitting text into service-sized chunks
 * - `gateway`: one chunk through one service call, with retry and degradation
 * - `pipeline`: sequential per-document driver with pacing and idempotent output
 */

pub use self::chunker::{Chunk, ChunkPolicy, Chunker};
pub use self::gateway::{
    ChunkOutcome, RetryDecision, RetryPolicy, RetryState, TranslationResult, TranslatorGateway,
};
pub use self::pipeline::{
    BatchSummary, DegradedChunk, DocumentOutcome, DocumentReport, DocumentState, DocumentStore, Pacing,
    PipelineDriver, PipelineEvent, PipelineOptions, TranscriptDocument,
};

pub mod chunker;
pub mod gateway;
pub mod pipeline;
