/*!
 * End-to-end pipeline tests against temporary transcript folders
 */

use anyhow::Result;
use std::cell::RefCell;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use transcript_translator::app_config::PathsConfig;
use transcript_translator::errors::ProviderError;
use transcript_translator::providers::mock::MockProvider;
use transcript_translator::providers::{Translator, TranslatorFactory};
use transcript_translator::transcript_store::TranscriptStore;
use transcript_translator::translation::{
    BatchSummary, Chunker, ChunkPolicy, Pacing, PipelineDriver, PipelineEvent, PipelineOptions,
};
use crate::common::{self, TranscriptFolders};

fn store_for(folders: &TranscriptFolders) -> Result<TranscriptStore> {
    let paths = PathsConfig {
        input_root: folders.input.clone(),
        output_root: folders.output.clone(),
        ..PathsConfig::default()
    };
    TranscriptStore::from_config(&paths)
}

async fn run_batch(
    folders: &TranscriptFolders,
    options: PipelineOptions,
    factory: &dyn TranslatorFactory,
) -> Result<BatchSummary> {
    common::init_logging();
    let store = store_for(folders)?;
    let documents = store.discover(&[])?;
    let driver = PipelineDriver::new(options, factory);
    Ok(driver.run(&store, &documents, &|_| {}).await)
}

/// Counts sessions, optionally refusing to open them
struct CountingFactory {
    mock: MockProvider,
    opened: AtomicUsize,
    refuse: bool,
}

impl CountingFactory {
    fn new(mock: MockProvider) -> Self {
        Self {
            mock,
            opened: AtomicUsize::new(0),
            refuse: false,
        }
    }
}

impl TranslatorFactory for CountingFactory {
    fn open_session(&self) -> Result<Box<dyn Translator>, ProviderError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(ProviderError::NotConfigured("no session today".to_string()));
        }
        Ok(Box::new(self.mock.clone()))
    }
}

/// A 9000-character transcript is translated in two calls and joined in order
#[tokio::test]
async fn test_run_with9000CharTranscript_shouldTranslateTwoChunks() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    let text = common::transcript_of(90, 99);
    folders.add_raw("ep004_raw.txt", &text)?;
    let mock = MockProvider::working();

    let summary = run_batch(&folders, common::fast_options(4500, 3), &mock).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.chunks_translated, 2);
    assert_eq!(mock.call_count(), 2);

    let chunks = Chunker::new(ChunkPolicy::Lines, 4500).chunk(&text);
    let expected = format!("[en] {}\n[en] {}", chunks[0].text.trim(), chunks[1].text.trim());
    assert_eq!(folders.read_output("ep004_cleaned.txt")?, expected);
    Ok(())
}

/// A second run over the same folders makes no calls and leaves outputs untouched
#[tokio::test]
async fn test_run_twice_shouldSkipFinishedTranscripts() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "pehla\ndoosra")?;
    folders.add_raw("ep002_raw.txt", "teesra")?;

    let first = MockProvider::working();
    run_batch(&folders, common::fast_options(4500, 3), &first).await?;
    let before = folders.read_output("ep001_cleaned.txt")?;

    let second = MockProvider::working();
    let summary = run_batch(&folders, common::fast_options(4500, 3), &second).await?;

    assert_eq!(second.call_count(), 0);
    assert_eq!(summary.skipped_existing, 2);
    assert_eq!(summary.processed, 0);
    assert_eq!(folders.read_output("ep001_cleaned.txt")?, before);
    Ok(())
}

/// Only the missing output is produced when a batch is resumed
#[tokio::test]
async fn test_run_withOnePreexistingOutput_shouldTranslateOnlyTheOther() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "pehla")?;
    folders.add_raw("ep002_raw.txt", "doosra")?;
    fs::create_dir_all(&folders.output)?;
    common::create_test_file(&folders.output, "ep001_cleaned.txt", "done earlier")?;
    let mock = MockProvider::working();

    let summary = run_batch(&folders, common::fast_options(4500, 3), &mock).await?;

    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(mock.requests()[0].text, "doosra");
    assert_eq!(folders.read_output("ep001_cleaned.txt")?, "done earlier");
    assert_eq!(folders.read_output("ep002_cleaned.txt")?, "[en] doosra");
    Ok(())
}

/// A chunk that never translates leaves a gap but the batch carries on
#[tokio::test]
async fn test_run_withPermanentlyFailingChunk_shouldDegradeAndContinue() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "aaaa\nPOISON\ncccc")?;
    folders.add_raw("ep002_raw.txt", "dddd")?;
    let mock = MockProvider::working().with_failure_when(|r| r.text.contains("POISON"));

    let summary = run_batch(&folders, common::fast_options(6, 3), &mock).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.chunks_degraded, 1);
    assert_eq!(summary.exit_code(), 0);
    // 1 + 3 attempts + 1 for the first transcript, 1 for the second
    assert_eq!(mock.call_count(), 6);

    let report = &summary.reports_with_degraded[0];
    assert_eq!(report.identifier, "ep001_raw");
    assert_eq!(report.degraded[0].index, 1);
    assert_eq!(report.degraded[0].attempts, 3);

    assert_eq!(folders.read_output("ep001_cleaned.txt")?, "[en] aaaa\n\n[en] cccc");
    assert_eq!(folders.read_output("ep002_cleaned.txt")?, "[en] dddd");
    Ok(())
}

/// Whitespace-only transcripts produce no output and no calls
#[tokio::test]
async fn test_run_withBlankTranscript_shouldSkipWithoutWriting() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "  \n\n\t\n")?;
    let mock = MockProvider::working();

    let summary = run_batch(&folders, common::fast_options(4500, 3), &mock).await?;

    assert_eq!(summary.skipped_empty, 1);
    assert_eq!(mock.call_count(), 0);
    assert!(!folders.output_exists("ep001_cleaned.txt"));
    Ok(())
}

/// Transcripts and their chunks reach the service strictly in order
#[tokio::test]
async fn test_run_withSeveralTranscripts_shouldCallServiceInOrder() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep002_raw.txt", "c1\nc2")?;
    folders.add_raw("ep001_raw.txt", "a1\na2\na3")?;
    let mock = MockProvider::working();

    run_batch(&folders, common::fast_options(2, 1), &mock).await?;

    let sent: Vec<String> = mock.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(sent, vec!["a1", "a2", "a3", "c1", "c2"]);
    assert_eq!(folders.read_output("ep001_cleaned.txt")?, "[en] a1\n[en] a2\n[en] a3");
    Ok(())
}

/// Each transcript gets its own session
#[tokio::test]
async fn test_run_withThreeTranscripts_shouldOpenOneSessionEach() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    for name in ["ep001_raw.txt", "ep002_raw.txt", "ep003_raw.txt"] {
        folders.add_raw(name, "kuch bhi")?;
    }
    let factory = CountingFactory::new(MockProvider::working());

    run_batch(&folders, common::fast_options(4500, 3), &factory).await?;

    assert_eq!(factory.opened.load(Ordering::SeqCst), 3);
    Ok(())
}

/// A session that cannot be opened fails that transcript only
#[tokio::test]
async fn test_run_withUnavailableSession_shouldCountFailuresAndExitNonZero() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "ek")?;
    folders.add_raw("ep002_raw.txt", "do")?;
    let mut factory = CountingFactory::new(MockProvider::working());
    factory.refuse = true;

    let summary = run_batch(&folders, common::fast_options(4500, 3), &factory).await?;

    assert_eq!(summary.failed, 2);
    assert_eq!(factory.opened.load(Ordering::SeqCst), 2);
    assert_eq!(summary.exit_code(), 1);
    assert!(!folders.output_exists("ep001_cleaned.txt"));
    Ok(())
}

/// An unreadable transcript fails alone; the next one is still translated
#[tokio::test]
async fn test_run_withUnreadableTranscript_shouldContinueWithNext() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "ek")?;
    folders.add_raw("ep002_raw.txt", "do")?;
    let store = store_for(&folders)?;
    let documents = store.discover(&[])?;
    fs::remove_file(&documents[0].source_path)?;
    let mock = MockProvider::working();
    let driver = PipelineDriver::new(common::fast_options(4500, 3), &mock);

    let summary = driver.run(&store, &documents, &|_| {}).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(folders.read_output("ep002_cleaned.txt")?, "[en] do");
    Ok(())
}

/// Pacing waits after every service call and never after a blank chunk
#[tokio::test(start_paused = true)]
async fn test_run_withPacing_shouldWaitOnlyAfterServiceCalls() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "aaa\n   \nbbb")?;
    let mock = MockProvider::working();
    let mut options = common::fast_options(3, 1);
    options.pacing = Pacing::new(Duration::from_millis(1000), Duration::ZERO);
    let started = tokio::time::Instant::now();

    let summary = run_batch(&folders, options, &mock).await?;

    assert_eq!(mock.call_count(), 2);
    assert_eq!(folders.read_output("ep001_cleaned.txt")?, "[en] aaa\n\n[en] bbb");
    assert_eq!(summary.chunks_translated, 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2000));
    assert!(elapsed < Duration::from_millis(2100));
    Ok(())
}

/// The observer sees each transcript move through its states
#[tokio::test]
async fn test_run_withObserver_shouldReportLifecycle() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "ek\ndo")?;
    let store = store_for(&folders)?;
    let documents = store.discover(&[])?;
    let mock = MockProvider::working();
    let driver = PipelineDriver::new(common::fast_options(2, 1), &mock);
    let seen = RefCell::new(Vec::new());

    driver
        .run(&store, &documents, &|event| {
            let line = match event {
                PipelineEvent::DocumentStarted { identifier, position, total } => {
                    format!("start {} {}/{}", identifier, position, total)
                }
                PipelineEvent::StateChanged { state, .. } => state.to_string(),
                PipelineEvent::DocumentFinished { identifier } => format!("finish {}", identifier),
            };
            seen.borrow_mut().push(line);
        })
        .await;

    assert_eq!(
        seen.into_inner(),
        vec![
            "start ep001_raw 1/1",
            "pending",
            "chunking",
            "translating chunk 1/2",
            "translating chunk 2/2",
            "assembled",
            "persisted",
            "finish ep001_raw",
        ]
    );
    Ok(())
}

/// Transcripts sharing a file name in different subfolders are both translated
#[tokio::test]
async fn test_run_withRecursiveSameNames_shouldTranslateBoth() -> Result<()> {
    common::init_logging();
    let folders = TranscriptFolders::new()?;
    fs::create_dir_all(folders.input.join("season1"))?;
    fs::create_dir_all(folders.input.join("season2"))?;
    folders.add_raw("season1/ep001_raw.txt", "pehla")?;
    folders.add_raw("season2/ep001_raw.txt", "doosra")?;
    let paths = PathsConfig {
        input_root: folders.input.clone(),
        output_root: folders.output.clone(),
        recursive: true,
        ..PathsConfig::default()
    };
    let store = TranscriptStore::from_config(&paths)?;
    let documents = store.discover(&[])?;
    let mock = MockProvider::working();
    let driver = PipelineDriver::new(common::fast_options(4500, 3), &mock);

    let summary = driver.run(&store, &documents, &|_| {}).await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped_existing, 0);
    assert_eq!(mock.call_count(), 2);
    assert_eq!(folders.read_output("season1/ep001_cleaned.txt")?, "[en] pehla");
    assert_eq!(folders.read_output("season2/ep001_cleaned.txt")?, "[en] doosra");
    Ok(())
}
