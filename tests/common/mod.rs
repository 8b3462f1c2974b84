/*!
 * Common test utilities for the transcript-translator test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

use transcript_translator::app_config::{Config, TranslationProvider};
use transcript_translator::translation::{ChunkPolicy, Pacing, PipelineOptions, RetryPolicy};

static INIT_LOGGING: Once = Once::new();

/// Route log output through the test harness
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Input and output folders under one temp root
pub struct TranscriptFolders {
    // Keeps the directory alive for the duration of the test
    pub root: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TranscriptFolders {
    pub fn new() -> Result<Self> {
        let root = create_temp_dir()?;
        let input = root.path().join("raw_transcripts");
        let output = root.path().join("cleaned_transcripts");
        fs::create_dir_all(&input)?;
        Ok(Self { root, input, output })
    }

    pub fn add_raw(&self, filename: &str, content: &str) -> Result<PathBuf> {
        create_test_file(&self.input, filename, content)
    }

    pub fn read_output(&self, filename: &str) -> Result<String> {
        Ok(fs::read_to_string(self.output.join(filename))?)
    }

    pub fn output_exists(&self, filename: &str) -> bool {
        self.output.join(filename).is_file()
    }
}

/// Config pointing at the given folders, with the mock provider and no waiting
pub fn fast_config(folders: &TranscriptFolders) -> Config {
    let mut config = Config::default();
    config.paths.input_root = folders.input.clone();
    config.paths.output_root = folders.output.clone();
    config.translation.provider = TranslationProvider::Mock;
    config.translation.common.retry_backoff_ms = 0;
    config.translation.common.inter_call_delay_ms = 0;
    config.translation.common.inter_call_jitter_ms = 0;
    config
}

/// Pipeline options with no backoff and no pacing
pub fn fast_options(max_chunk_len: usize, attempts: u32) -> PipelineOptions {
    PipelineOptions {
        chunk_policy: ChunkPolicy::Lines,
        max_chunk_len,
        separator: "\n".to_string(),
        retry: RetryPolicy::new(attempts, Duration::ZERO),
        pacing: Pacing::none(),
        source_language: "auto".to_string(),
        target_language: "en".to_string(),
    }
}

/// `lines` lines of `width` characters, each followed by a newline
pub fn transcript_of(lines: usize, width: usize) -> String {
    let mut text = String::with_capacity(lines * (width + 1));
    for i in 0..lines {
        let ch = char::from(b'a' + (i % 26) as u8);
        text.extend(std::iter::repeat_n(ch, width));
        text.push('\n');
    }
    text
}
