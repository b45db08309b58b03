// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use aist::app_config::{self, Config, TranslationProvider};
use aist::app_controller::{Controller, FileOutcome};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    #[value(name = "deepseek")]
    DeepSeek,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::DeepSeek => TranslationProvider::DeepSeek,
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
    /// Translate subtitle files (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for aist
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Subtitle file or directory of .srt/.ass files to process
    #[arg(value_name = "INPUT_PATH", default_value = ".")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Target language name (e.g. 'spanish'), or 'none' to copy files unchanged
    #[arg(short, long)]
    target_language: Option<String>,

    /// Directory translated files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum chunk size in bytes (0 sends each file as one request)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Number of retry rounds for lines that failed alignment
    #[arg(long)]
    max_retries: Option<u32>,

    /// Also process subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// AIST - AI Subtitles Translator
///
/// Translates SRT and ASS subtitle files with Gemini or DeepSeek while keeping
/// numbering, timing and styling intact.
#[derive(Parser, Debug)]
#[command(name = "aist")]
#[command(version)]
#[command(about = "AI-powered subtitle translation tool")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "AIST translates .srt and .ass subtitle files line by line using LLM providers.

EXAMPLES:
    aist                                    # Translate every subtitle in the current directory
    aist movie.srt                          # Translate a single file into output/
    aist -f movie.ass                       # Force overwrite an existing output
    aist -p deepseek -t german subs/        # Use DeepSeek and translate into German
    aist --chunk-size 4000 movie.srt        # Split requests into 4000-byte chunks
    aist -t none subs/                      # Copy files without translating
    aist completions bash > aist.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys may also be supplied through the
    GEMINI_API_KEY and DEEPSEEK_API_KEY environment variables.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (requires API key)
    deepseek  - DeepSeek API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: TranslateArgs,
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
        // The logger itself accepts everything; filtering happens through max_level
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Short tag for log level
    fn get_tag_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
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
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_tag_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "aist", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.args).await,
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.to_string_lossy().to_string();
    }

    if let Some(chunk_size) = options.chunk_size {
        config.translation.common.chunk_size = chunk_size;
    }

    if let Some(max_retries) = options.max_retries {
        config.translation.common.max_retries = max_retries;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    log::set_max_level(config.log_level.to_level_filter());

    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config.clone())?;
    let output_dir = PathBuf::from(&config.output_dir);

    if options.input_path.is_file() {
        match controller.run(options.input_path.clone(), output_dir, options.force_overwrite).await? {
            FileOutcome::Translated { output, untranslated, .. } if untranslated > 0 => {
                info!("Done: {} ({} lines kept in the original language)", output.display(), untranslated);
            }
            FileOutcome::Translated { output, .. } | FileOutcome::Copied { output } => {
                info!("Done: {}", output.display());
            }
            FileOutcome::Skipped { reason } => info!("Skipped: {}", reason),
        }
    } else if options.input_path.is_dir() {
        let summary = controller.run_folder(
            options.input_path.clone(),
            output_dir,
            options.force_overwrite,
            options.recursive,
        ).await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} file(s) failed to process", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
