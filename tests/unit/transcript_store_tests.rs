/*!
 * Tests for transcript discovery, naming and persistence
 */

use anyhow::Result;
use std::fs;
use transcript_translator::app_config::PathsConfig;
use transcript_translator::transcript_store::{DryRunStore, TranscriptStore, ISSUES_LOG_NAME};
use transcript_translator::translation::{DegradedChunk, DocumentReport, DocumentStore};
use crate::common::TranscriptFolders;

fn store_for(folders: &TranscriptFolders) -> Result<TranscriptStore> {
    let paths = PathsConfig {
        input_root: folders.input.clone(),
        output_root: folders.output.clone(),
        ..PathsConfig::default()
    };
    TranscriptStore::from_config(&paths)
}

fn identifiers(store: &TranscriptStore, only: &[String]) -> Result<Vec<String>> {
    Ok(store
        .discover(only)?
        .into_iter()
        .map(|d| d.identifier)
        .collect())
}

/// Only files matching the input pattern are discovered, sorted by name
#[test]
fn test_discover_withMixedFiles_shouldReturnMatchingSorted() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep010_raw.txt", "ten")?;
    folders.add_raw("ep002_raw.txt", "two")?;
    folders.add_raw("ep003_cleaned.txt", "not input")?;
    folders.add_raw("ep004_raw.txt.bak", "backup")?;
    let store = store_for(&folders)?;

    assert_eq!(identifiers(&store, &[])?, vec!["ep002_raw", "ep010_raw"]);
    Ok(())
}

/// The allow-list keeps its order, drops duplicates and missing names
#[test]
fn test_discover_withAllowList_shouldKeepGivenOrder() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "one")?;
    folders.add_raw("ep002_raw.txt", "two")?;
    let store = store_for(&folders)?;

    let only = vec![
        "ep002_raw.txt".to_string(),
        "ep999_raw.txt".to_string(),
        "ep001_raw.txt".to_string(),
        "ep002_raw.txt".to_string(),
    ];

    assert_eq!(identifiers(&store, &only)?, vec!["ep002_raw", "ep001_raw"]);
    Ok(())
}

/// A missing input folder is an error, not an empty batch
#[test]
fn test_discover_withMissingInputRoot_shouldFail() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    fs::remove_dir_all(&folders.input)?;
    let store = store_for(&folders)?;

    assert!(store.discover(&[]).is_err());
    Ok(())
}

/// Output names swap the raw marker for the cleaned one
#[test]
fn test_output_path_withRawMarker_shouldUseCleanedName() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    let store = store_for(&folders)?;

    assert_eq!(store.output_path("ep004_raw"), folders.output.join("ep004_cleaned.txt"));
    assert_eq!(store.output_path("interview"), folders.output.join("interview_cleaned.txt"));
    Ok(())
}

/// Persisting marks the document as done
#[test]
fn test_persist_shouldMarkDocumentDone() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "namaste")?;
    let store = store_for(&folders)?;
    let document = store.discover(&[])?.remove(0);

    assert!(!store.is_done(&document));
    assert_eq!(store.read_raw(&document)?, "namaste");

    let path = store.persist(&document, "hello")?;

    assert!(store.is_done(&document));
    assert_eq!(fs::read_to_string(path)?, "hello");
    Ok(())
}

/// The dry-run store reports a path but writes nothing
#[test]
fn test_dry_run_store_persist_shouldNotWrite() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "namaste")?;
    let store = store_for(&folders)?;
    let dry = DryRunStore::new(&store);
    let document = store.discover(&[])?.remove(0);

    let path = dry.persist(&document, "hello")?;

    assert_eq!(path, folders.output.join("ep001_cleaned.txt"));
    assert!(!path.exists());
    assert!(!dry.is_done(&document));
    Ok(())
}

/// Degraded chunks are appended to the issues log with 1-based numbers
#[test]
fn test_log_degraded_shouldAppendOneLinePerDocument() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    let store = store_for(&folders)?;
    let report = DocumentReport {
        identifier: "ep007_raw".to_string(),
        output_path: folders.output.join("ep007_cleaned.txt"),
        chunks: 4,
        translated: 3,
        blank: 0,
        degraded: vec![DegradedChunk {
            index: 2,
            attempts: 3,
            error: "Rate limit exceeded".to_string(),
        }],
    };

    store.log_degraded(&report)?;
    store.log_degraded(&report)?;

    let log = fs::read_to_string(folders.output.join(ISSUES_LOG_NAME))?;
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("ep007_raw: 1/4 chunk(s)"));
    assert!(log.contains("3 (3 attempts"));
    Ok(())
}

fn recursive_store_for(folders: &TranscriptFolders, input_pattern: &str) -> Result<TranscriptStore> {
    let paths = PathsConfig {
        input_root: folders.input.clone(),
        output_root: folders.output.clone(),
        input_pattern: input_pattern.to_string(),
        recursive: true,
        ..PathsConfig::default()
    };
    TranscriptStore::from_config(&paths)
}

/// Same file name in two subfolders yields two documents with two outputs
#[test]
fn test_discover_withRecursiveSameNames_shouldKeepSubfolders() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    fs::create_dir_all(folders.input.join("season1"))?;
    fs::create_dir_all(folders.input.join("season2"))?;
    folders.add_raw("season1/ep001_raw.txt", "first")?;
    folders.add_raw("season2/ep001_raw.txt", "second")?;
    let store = recursive_store_for(&folders, r"_raw\.txt$")?;

    let documents = store.discover(&[])?;
    let ids: Vec<&str> = documents.iter().map(|d| d.identifier.as_str()).collect();
    assert_eq!(ids, vec!["season1/ep001_raw", "season2/ep001_raw"]);

    store.persist(&documents[0], "one")?;
    assert!(store.is_done(&documents[0]));
    assert!(!store.is_done(&documents[1]));

    let path = store.persist(&documents[1], "two")?;
    assert_eq!(path, folders.output.join("season2").join("ep001_cleaned.txt"));
    assert_eq!(folders.read_output("season1/ep001_cleaned.txt")?, "one");
    assert_eq!(folders.read_output("season2/ep001_cleaned.txt")?, "two");
    Ok(())
}

/// Two inputs that map to one output file are rejected up front
#[test]
fn test_discover_withCollidingOutputs_shouldFail() -> Result<()> {
    let folders = TranscriptFolders::new()?;
    folders.add_raw("ep001_raw.txt", "raw")?;
    folders.add_raw("ep001.txt", "unmarked")?;
    let store = recursive_store_for(&folders, r"\.txt$")?;

    let error = store.discover(&[]).unwrap_err();
    assert!(error.to_string().contains("ep001_cleaned.txt"));
    Ok(())
}
