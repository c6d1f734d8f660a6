// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, LogLevel, TranslationProvider};
use app_controller::Controller;

mod app_config;
mod translation;
mod file_utils;
mod app_controller;
mod language_utils;
mod providers;
mod errors;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "lmstudio")]
    LMStudio,
    Gemini,
    Google,
    Aws,
    Mock,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::Aws => TranslationProvider::Aws,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text file (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for textwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Input text file to translate
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Output file (default: <stem>.<target>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'vi', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Maximum chunk size in characters
    #[arg(long)]
    max_chunk_size: Option<usize>,

    /// Maximum concurrent requests per window
    #[arg(long)]
    concurrency: Option<usize>,

    /// Pause between windows in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Translate repeated words once and substitute them afterwards
    #[arg(long)]
    dedup: bool,

    /// Send markup to the backend instead of placeholders
    #[arg(long)]
    no_protect: bool,

    /// Write the protected span table to this JSON file
    #[arg(long)]
    spans_out: Option<PathBuf>,

    /// Write the lexicon to this JSON file
    #[arg(long)]
    lexicon_out: Option<PathBuf>,
}

/// textwai - translate long texts through size-limited translation services
#[derive(Parser, Debug)]
#[command(name = "textwai")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Chunked long-text translation with markup protection")]
#[command(long_about = "textwai splits long texts into chunks, shields markup behind placeholders and
translates the chunks concurrently through a configurable backend.

EXAMPLES:
    textwai book.txt                              # Translate using default config
    textwai -f book.txt                           # Force overwrite existing output
    textwai -p openai -m gpt-4o-mini book.txt     # Use specific provider and model
    textwai -s en -t es -o book.es.txt book.txt   # English to Spanish, explicit output
    textwai --dedup --lexicon-out dict.json a.txt # Translate repeated words once
    textwai -p mock --log-level debug page.html   # Dry run without network
    textwai completions bash > textwai.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. An empty api_key falls back to TEXTWAI_API_KEY.

SUPPORTED PROVIDERS:
    ollama   - Local Ollama server (default: llama3.2:3b)
    openai   - OpenAI API (requires API key)
    lmstudio - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)
    gemini   - Google Gemini API (requires API key)
    google   - Google Cloud Translation v2 (requires API key)
    aws      - Amazon Translate (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION)
    mock     - Offline backend that tags text with the target language")]
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
        // The logger filters through `log::max_level`, so it can be raised later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
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
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "textwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

/// Load the configuration file, creating a default one when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = options.provider {
        config.translation.provider = provider.into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }
    if let Some(max_chunk_size) = options.max_chunk_size {
        config.pipeline.max_chunk_size = Some(max_chunk_size);
    }
    if let Some(concurrency) = options.concurrency {
        config.pipeline.concurrency = Some(concurrency);
    }
    if let Some(delay_ms) = options.delay_ms {
        config.pipeline.inter_batch_delay_ms = Some(delay_ms);
    }
    if options.dedup {
        config.pipeline.enable_deduplication = true;
    }
    if options.no_protect {
        config.pipeline.enable_span_protection = false;
    }
    if let Some(path) = &options.spans_out {
        config.artifacts.spans_path = Some(path.clone());
    }
    if let Some(path) = &options.lexicon_out {
        config.artifacts.lexicon_path = Some(path.clone());
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.into()));
    }

    let input_file = options.input_file.clone()
        .ok_or_else(|| anyhow!("INPUT_FILE is required when no subcommand is specified"))?;

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    controller.run(input_file, options.output.clone(), options.force_overwrite).await?;

    Ok(())
}
