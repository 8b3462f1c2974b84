use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::providers::mock::MockProvider;
use crate::providers::TranslatorFactory;
use crate::transcript_store::{DryRunStore, TranscriptStore};
use crate::translation::{
    BatchSummary, DocumentState, DocumentStore, Pacing, PipelineDriver, PipelineEvent,
    PipelineOptions,
};

// @module: Application controller for batch transcript translation

/// Main application controller for transcript translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate every pending transcript under the input root
    ///
    /// A dry run discovers and chunks documents as usual but translates with
    /// the mock provider, skips pacing and writes nothing.
    pub async fn run(&self, dry_run: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();

        let store = TranscriptStore::from_config(&self.config.paths)?;
        let documents = store.discover(&self.config.paths.only)?;
        if documents.is_empty() {
            warn!("No transcripts found in {}", store.input_root().display());
            return Ok(BatchSummary::default());
        }

        let mut options = PipelineOptions::from_config(&self.config);
        let mock = MockProvider::working();
        let factory: &dyn TranslatorFactory = if dry_run {
            options.pacing = Pacing::none();
            &mock
        } else {
            &self.config.translation
        };

        if dry_run {
            info!("Dry run: {} transcript(s), nothing will be written", documents.len());
        } else {
            info!(
                "🚀 {} - {} -> {} ({} transcript(s))",
                self.config.translation.provider.display_name(),
                crate::language_utils::describe_source_hint(&self.config.source_language),
                self.config.target_language,
                documents.len()
            );
        }

        let multi_progress = MultiProgress::new();
        let file_bar = multi_progress.add(ProgressBar::new(documents.len() as u64));
        file_bar.set_style(Self::bar_style("files"));
        file_bar.set_message("Processing files");
        let chunk_bar = multi_progress.add(ProgressBar::new(0));
        chunk_bar.set_style(Self::bar_style("chunks"));

        let observer = |event: PipelineEvent<'_>| match event {
            PipelineEvent::DocumentStarted { identifier, .. } => {
                file_bar.set_message(format!("Processing: {}", identifier));
                chunk_bar.reset();
                chunk_bar.set_length(0);
            }
            PipelineEvent::StateChanged { state, .. } => match state {
                DocumentState::Translating { chunk, of } => {
                    chunk_bar.set_length(of as u64);
                    chunk_bar.set_position(chunk.saturating_sub(1) as u64);
                    chunk_bar.set_message(state.to_string());
                }
                DocumentState::Assembled => chunk_bar.set_position(chunk_bar.length().unwrap_or(0)),
                _ => chunk_bar.set_message(state.to_string()),
            },
            PipelineEvent::DocumentFinished { .. } => file_bar.inc(1),
        };

        let driver = PipelineDriver::new(options, factory);
        let dry_store;
        let active_store: &dyn DocumentStore = if dry_run {
            dry_store = DryRunStore::new(&store);
            &dry_store
        } else {
            &store
        };
        let summary = driver.run(active_store, &documents, &observer).await;

        chunk_bar.finish_and_clear();
        file_bar.finish_with_message("Batch complete");

        self.report(&store, &summary, dry_run);
        info!("Finished in {}", Self::format_duration(start_time.elapsed()));

        Ok(summary)
    }

    fn report(&self, store: &TranscriptStore, summary: &BatchSummary, dry_run: bool) {
        info!("Batch summary: {}", summary);

        if dry_run {
            return;
        }

        for report in &summary.reports_with_degraded {
            warn!(
                "{}: {} of {} chunk(s) left empty",
                report.identifier,
                report.degraded.len(),
                report.chunks
            );
            if let Err(e) = store.log_degraded(report) {
                warn!("Failed to write issues log: {}", e);
            }
        }

        if !summary.reports_with_degraded.is_empty() {
            info!("Issues written to {}", store.issues_log_path().display());
        }
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| {
                ProgressStyle::default_bar()
                    .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}")
            })
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
