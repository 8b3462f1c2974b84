/*!
 * Resilient single-chunk translation.
 *
 * The gateway turns one chunk into one `TranslationResult`. Provider errors
 * never escape: a chunk is retried with a linear-by-attempt backoff and, once
 * the attempts run out, degrades to an empty result so the document can still
 * be assembled.
 */

use log::{debug, error, warn};
use std::time::Duration;

use crate::app_config::TranslationCommonConfig;
use crate::providers::Translator;

use super::chunker::Chunk;

/// Attempt budget and backoff unit for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// A zero attempt budget is raised to one so every chunk is tried
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self::new(common.retry_count, common.backoff_unit())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failure of `attempt` (1-based): 2 * attempt units
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt.saturating_mul(2))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then try again
    Retry { delay: Duration },
    /// The budget is exhausted
    GiveUp,
}

/// Retry bookkeeping for a single chunk
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    elapsed_backoff: Duration,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            elapsed_backoff: Duration::ZERO,
        }
    }

    /// Start the next attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Record a failure of the current attempt
    pub fn on_failure(&mut self) -> RetryDecision {
        if self.attempt >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }
        let delay = self.policy.backoff_after(self.attempt);
        self.elapsed_backoff += delay;
        RetryDecision::Retry { delay }
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Total backoff scheduled so far
    pub fn elapsed_backoff(&self) -> Duration {
        self.elapsed_backoff
    }
}

/// How a chunk ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The service returned a translation
    Translated { attempts: u32 },
    /// Nothing but whitespace; the service was not called
    Blank,
    /// Every attempt failed; the text is empty
    Degraded { attempts: u32, last_error: String },
}

/// Result for one chunk; `text` is empty for blank and degraded chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub index: usize,
    pub text: String,
    pub outcome: ChunkOutcome,
}

impl TranslationResult {
    fn blank(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            outcome: ChunkOutcome::Blank,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Degraded { .. })
    }

    /// Whether producing this result reached the external service
    pub fn called_service(&self) -> bool {
        !matches!(self.outcome, ChunkOutcome::Blank)
    }
}

/// Wraps a translator session with retry and degradation
pub struct TranslatorGateway<'a> {
    translator: &'a dyn Translator,
    policy: RetryPolicy,
    source_language: String,
    target_language: String,
}

impl<'a> TranslatorGateway<'a> {
    pub fn new(
        translator: &'a dyn Translator,
        policy: RetryPolicy,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            translator,
            policy,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// Translate one chunk. Always yields a result, never an error.
    pub async fn translate_chunk(&self, chunk: &Chunk) -> TranslationResult {
        let text = chunk.text.trim();
        if text.is_empty() {
            debug!("Chunk {} is blank, not sending it", chunk.index + 1);
            return TranslationResult::blank(chunk.index);
        }

        let mut state = RetryState::new(self.policy);
        loop {
            let attempt = state.begin_attempt();
            match self
                .translator
                .translate(text, &self.source_language, &self.target_language)
                .await
            {
                Ok(translated) => {
                    debug!(
                        "Chunk {} translated by {} on attempt {}",
                        chunk.index + 1,
                        self.translator.name(),
                        attempt
                    );
                    return TranslationResult {
                        index: chunk.index,
                        text: translated,
                        outcome: ChunkOutcome::Translated { attempts: attempt },
                    };
                }
                Err(e) => {
                    warn!(
                        "Chunk {} attempt {}/{} failed: {}",
                        chunk.index + 1,
                        attempt,
                        self.policy.max_attempts(),
                        e
                    );
                    match state.on_failure() {
                        RetryDecision::Retry { delay } => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        RetryDecision::GiveUp => {
                            error!(
                                "Chunk {} skipped after {} failed attempts",
                                chunk.index + 1,
                                state.attempts()
                            );
                            return TranslationResult {
                                index: chunk.index,
                                text: String::new(),
                                outcome: ChunkOutcome::Degraded {
                                    attempts: state.attempts(),
                                    last_error: e.to_string(),
                                },
                            };
                        }
                    }
                }
            }
        }
    }
}
