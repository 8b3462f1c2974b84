/*!
 * On-disk transcript layout.
 *
 * Raw transcripts live under the input root (`ep004_raw.txt`); their
 * translations go under the output root with the raw marker swapped for the
 * cleaned marker (`ep004_cleaned.txt`). Subfolders of a recursive scan are
 * mirrored, so `season1/ep001_raw.txt` becomes `season1/ep001_cleaned.txt`.
 * An existing output file marks the transcript as done.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use crate::app_config::PathsConfig;
use crate::file_utils::FileManager;
use crate::translation::{DocumentReport, DocumentStore, TranscriptDocument};

/// Name of the issues log written to the output root
pub const ISSUES_LOG_NAME: &str = "translate.issues.log";

/// File-backed input and output collaborator
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    input_root: PathBuf,
    output_root: PathBuf,
    pattern: Regex,
    raw_marker: String,
    cleaned_marker: String,
    output_extension: String,
    recursive: bool,
}

impl TranscriptStore {
    pub fn from_config(paths: &PathsConfig) -> Result<Self> {
        let pattern = Regex::new(&paths.input_pattern)
            .with_context(|| format!("Invalid input pattern: {}", paths.input_pattern))?;

        Ok(Self {
            input_root: paths.input_root.clone(),
            output_root: paths.output_root.clone(),
            pattern,
            raw_marker: paths.raw_marker.clone(),
            cleaned_marker: paths.cleaned_marker.clone(),
            output_extension: paths.output_extension.trim_start_matches('.').to_string(),
            recursive: paths.recursive,
        })
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// List the documents to process
    ///
    /// With an empty allow-list every file matching the input pattern is
    /// returned, sorted by path. Otherwise the listed file names are returned
    /// in the given order; names that do not exist are logged and dropped.
    /// Fails if two documents would be written to the same output file.
    pub fn discover(&self, only: &[String]) -> Result<Vec<TranscriptDocument>> {
        if !FileManager::dir_exists(&self.input_root) {
            return Err(anyhow!("Input folder not found: {}", self.input_root.display()));
        }

        let documents = if only.is_empty() {
            let paths = FileManager::find_files(&self.input_root, self.recursive, |name| {
                self.pattern.is_match(name)
            })?;
            paths.iter().map(|p| self.document_for(p)).collect()
        } else {
            self.listed_documents(only)
        };

        self.check_distinct_outputs(&documents)?;
        Ok(documents)
    }

    fn listed_documents(&self, only: &[String]) -> Vec<TranscriptDocument> {

        let mut seen = HashSet::new();
        let mut documents = Vec::new();
        for name in only {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let path = self.input_root.join(name);
            if FileManager::file_exists(&path) {
                documents.push(self.document_for(&path));
            } else {
                warn!("Listed transcript not found: {}", path.display());
            }
        }
        documents
    }

    /// Identifier is the path below the input root, `/`-separated, without extension
    fn document_for(&self, path: &Path) -> TranscriptDocument {
        let relative = match path.strip_prefix(&self.input_root) {
            Ok(relative) => relative,
            Err(_) => Path::new(path.file_name().unwrap_or_default()),
        };

        let mut parts: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        parts.push(
            relative
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        TranscriptDocument {
            identifier: parts.join("/"),
            source_path: path.to_path_buf(),
        }
    }

    fn check_distinct_outputs(&self, documents: &[TranscriptDocument]) -> Result<()> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        for document in documents {
            let output = self.output_path(&document.identifier);
            if let Some(first) = claimed.insert(output.clone(), &document.source_path) {
                return Err(anyhow!(
                    "{} and {} would both be written to {}",
                    first.display(),
                    document.source_path.display(),
                    output.display()
                ));
            }
        }
        Ok(())
    }

    /// Output identifier for an input identifier
    ///
    /// Identifiers without the raw marker get the cleaned marker appended, so
    /// an output never takes the input's name.
    pub fn output_identifier(&self, identifier: &str) -> String {
        if identifier.contains(&self.raw_marker) {
            identifier.replace(&self.raw_marker, &self.cleaned_marker)
        } else {
            format!("{}{}", identifier, self.cleaned_marker)
        }
    }

    /// Full output path for an input identifier
    ///
    /// Folders in the identifier are kept; only the file name is renamed.
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        let (folder, stem) = identifier.rsplit_once('/').unwrap_or(("", identifier));
        let name = format!("{}.{}", self.output_identifier(stem), self.output_extension);
        if folder.is_empty() {
            self.output_root.join(name)
        } else {
            self.output_root.join(folder).join(name)
        }
    }

    /// Path of the issues log
    pub fn issues_log_path(&self) -> PathBuf {
        self.output_root.join(ISSUES_LOG_NAME)
    }

    /// Record degraded chunks of a document in the issues log
    pub fn log_degraded(&self, report: &DocumentReport) -> Result<()> {
        let indexes: Vec<String> = report
            .degraded
            .iter()
            .map(|d| format!("{} ({} attempts: {})", d.index + 1, d.attempts, d.error))
            .collect();
        let line = format!(
            "{}: {}/{} chunk(s) left empty after exhausting retries: {}",
            report.identifier,
            report.degraded.len(),
            report.chunks,
            indexes.join("; ")
        );
        FileManager::append_to_log_file(self.issues_log_path(), &line)
    }
}

impl DocumentStore for TranscriptStore {
    fn is_done(&self, document: &TranscriptDocument) -> bool {
        FileManager::file_exists(self.output_path(&document.identifier))
    }

    fn read_raw(&self, document: &TranscriptDocument) -> Result<String> {
        debug!("Reading {}", document.source_path.display());
        FileManager::read_to_string(&document.source_path)
    }

    fn persist(&self, document: &TranscriptDocument, text: &str) -> Result<PathBuf> {
        let path = self.output_path(&document.identifier);
        FileManager::write_atomically(&path, text)?;
        Ok(path)
    }
}

/// Store wrapper that reads for real but never writes
pub struct DryRunStore<'a> {
    inner: &'a TranscriptStore,
}

impl<'a> DryRunStore<'a> {
    pub fn new(inner: &'a TranscriptStore) -> Self {
        Self { inner }
    }
}

impl DocumentStore for DryRunStore<'_> {
    fn is_done(&self, document: &TranscriptDocument) -> bool {
        self.inner.is_done(document)
    }

    fn read_raw(&self, document: &TranscriptDocument) -> Result<String> {
        self.inner.read_raw(document)
    }

    fn persist(&self, document: &TranscriptDocument, text: &str) -> Result<PathBuf> {
        let path = self.inner.output_path(&document.identifier);
        debug!("Dry run: would write {} chars to {}", text.chars().count(), path.display());
        Ok(path)
    }
}
