use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::language_utils;
use crate::translation::chunker::ChunkPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language hint (ISO code or "auto")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Where transcripts are read from and written to
    #[serde(default)]
    pub paths: PathsConfig,

    /// How documents are split before translation
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Public Google web translation endpoint
    #[default]
    Google,
    // @provider: Ollama
    Ollama,
    // @provider: Anthropic
    Anthropic,
    // @provider: Deterministic offline stub (dry runs)
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name (LLM providers only)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Input/output locations and file naming
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    /// Directory holding raw transcripts
    #[serde(default = "default_input_root")]
    pub input_root: PathBuf,

    /// Directory receiving cleaned transcripts
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Regex a file name must match to be picked up in scan mode
    #[serde(default = "default_input_pattern")]
    pub input_pattern: String,

    /// Marker in the identifier that denotes a raw transcript
    #[serde(default = "default_raw_marker")]
    pub raw_marker: String,

    /// Replacement marker for the cleaned transcript identifier
    #[serde(default = "default_cleaned_marker")]
    pub cleaned_marker: String,

    /// Extension of the written files, without the dot
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Descend into subdirectories when scanning
    #[serde(default)]
    pub recursive: bool,

    /// Explicit file names to process; empty means scan everything matching
    #[serde(default)]
    pub only: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_root: default_input_root(),
            output_root: default_output_root(),
            input_pattern: default_input_pattern(),
            raw_marker: default_raw_marker(),
            cleaned_marker: default_cleaned_marker(),
            output_extension: default_output_extension(),
            recursive: false,
            only: Vec::new(),
        }
    }
}

/// Chunking settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum characters sent to the service in one call
    #[serde(default = "default_max_chunk_len")]
    pub max_chunk_len: usize,

    /// Line-aware (default) or word-based packing
    #[serde(default)]
    pub policy: ChunkPolicy,

    /// Separator placed between translated chunks in the output
    #[serde(default = "default_chunk_separator")]
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: default_max_chunk_len(),
            policy: ChunkPolicy::default(),
            separator: default_chunk_separator(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for LLM providers
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Attempts per chunk before it degrades to an empty result
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff unit in milliseconds; attempt k waits 2 * k units
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Fixed pause after every service call, in milliseconds
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,

    /// Upper bound of the random extra pause added to the fixed one
    #[serde(default = "default_inter_call_jitter_ms")]
    pub inter_call_jitter_ms: u64,

    /// Temperature parameter for LLM providers (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
            inter_call_jitter_ms: default_inter_call_jitter_ms(),
            temperature: default_temperature(),
        }
    }
}

impl TranslationCommonConfig {
    /// Backoff unit as a duration
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    language_utils::AUTO_DETECT.to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_input_root() -> PathBuf {
    PathBuf::from("data/raw_transcripts")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("data/cleaned_transcripts")
}

fn default_input_pattern() -> String {
    r"_raw\.txt$".to_string()
}

fn default_raw_marker() -> String {
    "_raw".to_string()
}

fn default_cleaned_marker() -> String {
    "_cleaned".to_string()
}

fn default_output_extension() -> String {
    "txt".to_string()
}

fn default_max_chunk_len() -> usize {
    4500 // stays under the 5000 character cap of the web endpoint
}

fn default_chunk_separator() -> String {
    "\n".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_inter_call_delay_ms() -> u64 {
    1000
}

fn default_inter_call_jitter_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.3
}

fn default_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "llama3.2:3b".to_string(),
        TranslationProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
        TranslationProvider::Google | TranslationProvider::Mock => String::new(),
    }
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Google => "https://translate.googleapis.com".to_string(),
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        TranslationProvider::Mock => String::new(),
    }
}

fn default_system_prompt() -> String {
    "You are a professional transcript translator. Translate the following text from {source_language} to {target_language}. Return only the translation, keeping the line structure.".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_source_hint(&self.source_language)
            .context("Invalid source language")?;
        language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        if self.chunking.max_chunk_len == 0 {
            return Err(anyhow!("chunking.max_chunk_len must be greater than zero"));
        }

        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("translation.common.retry_count must be at least 1"));
        }

        if self.paths.raw_marker.is_empty() || self.paths.cleaned_marker.is_empty() {
            return Err(anyhow!("paths.raw_marker and paths.cleaned_marker must not be empty"));
        }

        if self.paths.raw_marker == self.paths.cleaned_marker {
            return Err(anyhow!("paths.raw_marker and paths.cleaned_marker must differ"));
        }

        Regex::new(&self.paths.input_pattern)
            .with_context(|| format!("Invalid paths.input_pattern: {}", self.paths.input_pattern))?;

        if self.translation.provider == TranslationProvider::Anthropic
            && self.translation.get_api_key().is_empty()
        {
            return Err(anyhow!("Translation API key is required for Anthropic provider"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            paths: PathsConfig::default(),
            chunking: ChunkingConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model(self.provider))
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(self.provider))
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = self
            .get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|s| *s > 0)
            .unwrap_or_else(default_timeout_secs);
        Duration::from_secs(secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Google),
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
