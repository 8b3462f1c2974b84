// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use transcript_translator::app_config::{self, Config, TranslationProvider};
use transcript_translator::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    Ollama,
    Anthropic,
    Mock,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate pending transcripts (default command)
    Translate(TranslateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Folder holding the raw transcripts
    #[arg(short, long, env = "TRANSCRIPT_INPUT_ROOT")]
    input_root: Option<PathBuf>,

    /// Folder receiving the translated transcripts
    #[arg(short, long, env = "TRANSCRIPT_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// Only process these file names (repeatable, order kept)
    #[arg(long, value_name = "FILE_NAME")]
    only: Vec<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for LLM providers
    #[arg(short, long)]
    model: Option<String>,

    /// Source language hint (ISO code or 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Maximum characters per chunk
    #[arg(long)]
    max_chunk_len: Option<usize>,

    /// Attempts per chunk before leaving it empty
    #[arg(long)]
    retries: Option<u32>,

    /// Base pause after each service call, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Chunk and translate with the mock provider, writing nothing
    #[arg(long)]
    dry_run: bool,
}

/// Transcript Translator
///
/// Translates folders of raw speech-to-text transcripts into a target
/// language, one chunk at a time, resuming where the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "transcript-translator")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Batch transcript translation tool")]
#[command(long_about = "Translates every *_raw.txt transcript of an input folder and writes the
result as *_cleaned.txt into an output folder. Transcripts whose output already exists are skipped,
so an interrupted run can simply be restarted.

EXAMPLES:
    transcript-translator                                  # Translate using conf.json
    transcript-translator -i data/raw -o data/clean        # Override folders
    transcript-translator --only ep004_raw.txt             # Translate a single transcript
    transcript-translator -p ollama -m llama3.2:3b         # Use a local LLM
    transcript-translator --dry-run                        # Show what would be translated
    transcript-translator completions bash > tt.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    google    - Public Google Translate endpoint (default, no key)
    ollama    - Local Ollama server (default: llama3.2:3b)
    anthropic - Anthropic Claude API (requires API key)
    mock      - Offline stub, echoes the text")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Enable everything here; the effective level is the global max level
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let args = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "transcript-translator", &mut std::io::stdout());
            return;
        }
        Some(Commands::Translate(args)) => args,
        None => cli.translate,
    };

    match run_translate(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<i32> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let summary = controller.run(options.dry_run).await?;

    if summary.failed > 0 {
        warn!("{} transcript(s) failed, rerun to retry them", summary.failed);
    } else {
        info!("Done");
    }

    Ok(summary.exit_code())
}

fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config
        .save(config_path)
        .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(input_root) = &options.input_root {
        config.paths.input_root = input_root.clone();
    }

    if let Some(output_root) = &options.output_root {
        config.paths.output_root = output_root.clone();
    }

    if !options.only.is_empty() {
        config.paths.only = options.only.clone();
    }

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(max_chunk_len) = options.max_chunk_len {
        config.chunking.max_chunk_len = max_chunk_len;
    }

    if let Some(retries) = options.retries {
        config.translation.common.retry_count = retries;
    }

    if let Some(delay_ms) = options.delay_ms {
        config.translation.common.inter_call_delay_ms = delay_ms;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
