/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use transcript_translator::app_config::Config;
use transcript_translator::app_controller::Controller;
use crate::common::{self, TranscriptFolders};

/// Test the controller with a mock-backed configuration
#[tokio::test]
async fn test_controller_run_withMockProvider_shouldWriteCleanedTranscripts() -> Result<()> {
    common::init_logging();
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "namaste\nduniya")?;
    folders.add_raw("ep002_raw.txt", "phir milenge")?;
    folders.add_raw("readme.md", "ignored")?;

    let controller = Controller::with_config(common::fast_config(&folders))?;
    let summary = controller.run(false).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(folders.read_output("ep001_cleaned.txt")?, "[en] namaste\nduniya");
    assert_eq!(folders.read_output("ep002_cleaned.txt")?, "[en] phir milenge");
    Ok(())
}

/// Test that a dry run reads and chunks but writes nothing
#[tokio::test]
async fn test_dry_run_withTestData_shouldNotProduceOutput() -> Result<()> {
    common::init_logging();
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "namaste")?;

    let mut config = common::fast_config(&folders);
    // The dry run must not need the real service
    config.translation.provider = Default::default();
    config.translation.common.inter_call_delay_ms = 60_000;
    let controller = Controller::with_config(config)?;
    let summary = controller.run(true).await?;

    assert_eq!(summary.processed, 1);
    assert!(!folders.output_exists("ep001_cleaned.txt"));
    assert!(!folders.output.exists());
    Ok(())
}

/// Test the allow-list from the configuration
#[tokio::test]
async fn test_controller_run_withOnlyList_shouldTranslateListedTranscripts() -> Result<()> {
    common::init_logging();
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "ek")?;
    folders.add_raw("ep002_raw.txt", "do")?;

    let mut config = common::fast_config(&folders);
    config.paths.only = vec!["ep002_raw.txt".to_string()];
    let controller = Controller::with_config(config)?;
    let summary = controller.run(false).await?;

    assert_eq!(summary.processed, 1);
    assert!(!folders.output_exists("ep001_cleaned.txt"));
    assert!(folders.output_exists("ep002_cleaned.txt"));
    Ok(())
}

/// Test that an empty input folder is not an error
#[tokio::test]
async fn test_controller_run_withEmptyFolder_shouldReturnEmptySummary() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    let controller = Controller::with_config(common::fast_config(&folders))?;

    let summary = controller.run(false).await?;

    assert_eq!(summary.processed + summary.skipped_existing + summary.failed, 0);
    assert_eq!(summary.exit_code(), 0);
    Ok(())
}

/// Test that a missing input folder is reported
#[tokio::test]
async fn test_controller_run_withMissingInputRoot_shouldFail() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    let mut config = common::fast_config(&folders);
    config.paths.input_root = folders.root.path().join("does_not_exist");

    let controller = Controller::with_config(config)?;

    assert!(controller.run(false).await.is_err());
    Ok(())
}

/// Test the controller with custom languages keeps them
#[test]
fn test_controller_with_custom_config_shouldKeepLanguages() -> Result<()> {
    let mut config = Config::default();
    config.source_language = "hi".to_string();
    config.target_language = "de".to_string();

    let controller = Controller::with_config(config)?;

    assert_eq!(controller.config().source_language, "hi");
    assert_eq!(controller.config().target_language, "de");
    Ok(())
}
