// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use rubisub::app_config::{self, Config};
use rubisub::difficulty::ProficiencyLevel;
use rubisub::errors::{AppError, ConfigError};
use rubisub::file_utils::FileManager;
use rubisub::pipeline::{PipelineConfig, PipelineOutput, PipelineStage, PipelineStatistics, RubyPipeline};
use rubisub::runner::{self, PipelineEvent, PipelineHandle};

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
    /// Annotate an SRT file or every SRT file in a directory (default command)
    Annotate(AnnotateArgs),

    /// Generate shell completions for rubisub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct AnnotateArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: AnnotateOptions,
}

/// Options shared by the default command and `annotate`
#[derive(Args, Debug, Clone)]
struct AnnotateOptions {
    /// Directory receiving the ASS files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output file name, single-file input only
    #[arg(long)]
    output_name: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// DeepL authentication key
    #[arg(short = 'k', long, env = "DEEPL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// NGSL tier at or above which a word is annotated (1-3)
    #[arg(long)]
    ngsl_threshold: Option<u8>,

    /// CEFR band at or above which a word is annotated (A1-C2)
    #[arg(long)]
    cefr_threshold: Option<ProficiencyLevel>,

    /// Frequency rank at or above which a word is annotated
    #[arg(long)]
    frequency_threshold: Option<u32>,

    /// Never annotate proper nouns
    #[arg(long)]
    exclude_proper_nouns: bool,

    /// Use the paid DeepL endpoint
    #[arg(long)]
    pro: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// Rubisub - inline glosses for English subtitles
///
/// Finds the difficult words of an English SRT file, translates them and
/// writes a dual-track ASS file with the glosses above each line.
#[derive(Parser, Debug)]
#[command(name = "rubisub")]
#[command(version)]
#[command(about = "Annotate difficult subtitle words with inline translations")]
#[command(long_about = "Rubisub grades every word of an English SRT file against the NGSL, CEFR and
frequency lists, translates the difficult ones with DeepL and renders an ASS file
with the original line on one track and the translations on another.

EXAMPLES:
    rubisub movie.srt                            # Write movie_ruby.ass next to the input
    rubisub -o out/ movie.srt                    # Write into out/
    rubisub -f movie.srt                         # Force overwrite existing files
    rubisub --cefr-threshold B2 movie.srt        # Only annotate B2 words and above
    rubisub --exclude-proper-nouns movie.srt     # Leave names alone
    rubisub --log-level debug /subtitles/        # Process entire directory with debug logging
    rubisub completions bash > rubisub.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The DeepL key may also be given through the
    DEEPL_API_KEY environment variable.")]
#[command(args_conflicts_with_subcommands = true)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: AnnotateOptions,
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
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
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
                Self::get_emoji_for_level(level),
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
    // Logger starts at trace and is narrowed with set_max_level once the
    // configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "rubisub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Annotate(args)) => run_annotate(args).await,
        None => {
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            run_annotate(AnnotateArgs {
                input_path,
                options: cli.options,
            })
            .await
        }
    }
}

/// Load the configuration file and lay the command line overrides on top
fn build_config(options: &AnnotateOptions) -> Result<Config> {
    let mut config = Config::load(&options.config_path)
        .with_context(|| format!("Failed to load configuration from {}", options.config_path))?;

    if let Some(api_key) = &options.api_key {
        config.translation.api_key = api_key.clone();
    }

    if let Some(threshold) = options.ngsl_threshold {
        config.difficulty.ngsl_threshold = threshold;
    }

    if let Some(threshold) = options.cefr_threshold {
        config.difficulty.cefr_threshold = threshold;
    }

    if let Some(threshold) = options.frequency_threshold {
        config.difficulty.frequency_threshold = threshold;
    }

    if options.exclude_proper_nouns {
        config.pos_filter.exclude_proper_nouns = true;
    }

    if options.pro {
        config.translation.use_pro_api = true;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_annotate(args: AnnotateArgs) -> Result<()> {
    // Apply the command line log level before loading anything
    if let Some(level) = &args.options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = build_config(&args.options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let input_path = &args.input_path;
    let options = &args.options;

    if input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };

        if let Some(output) = annotate_file(&config, input_path, &output_dir, options.output_name.as_deref(), options.force_overwrite).await? {
            print_statistics(&output.statistics);
            info!("Success: {}", output.output_path.display());
        }
    } else if input_path.is_dir() {
        if options.output_name.is_some() {
            warn!("--output-name is ignored when processing a directory");
        }
        annotate_folder(&config, input_path, options.output_dir.as_deref(), options.force_overwrite).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {}", input_path.display()));
    }

    Ok(())
}

/// Run the pipeline for one file in the background and follow its progress.
/// Returns `None` when the output already exists and overwriting is off.
async fn annotate_file(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    output_name: Option<&str>,
    force_overwrite: bool,
) -> Result<Option<PipelineOutput>> {
    let mut pipeline_config = PipelineConfig::from_config(config, input, output_dir);
    if let Some(name) = output_name {
        pipeline_config = pipeline_config.with_output_filename(name);
    }

    let output_path = pipeline_config.output_path();
    if output_path.exists() && !force_overwrite {
        warn!("Output file already exists: {}. Use -f to force overwrite.", output_path.display());
        return Ok(None);
    }

    pipeline_config.validate()?;

    info!("🚀 Rubisub: {}", input.display());
    let pipeline = RubyPipeline::from_app_config(pipeline_config, config)?;
    let PipelineHandle { mut events, task } = runner::spawn_pipeline(pipeline);

    let progress_bar = ProgressBar::new(PipelineStage::total() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stages {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));

    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Progress(progress) => {
                // the bar counts finished stages
                let done = if progress.stage == PipelineStage::Complete {
                    progress.current
                } else {
                    progress.current - 1
                };
                progress_bar.set_position(done as u64);
                progress_bar.set_message(progress.message);
            }
            PipelineEvent::Finished(_) => progress_bar.finish_with_message("Done"),
            PipelineEvent::Failed(message) => {
                progress_bar.abandon_with_message("Failed");
                debug!("Pipeline reported failure: {}", message);
            }
        }
    }

    let output = task.await.map_err(|e| anyhow!("Pipeline task failed: {}", e))??;
    Ok(Some(output))
}

/// Annotate every SRT file below `input_dir`, one after another
async fn annotate_folder(config: &Config, input_dir: &Path, output_dir: Option<&Path>, force_overwrite: bool) -> Result<()> {
    let files = FileManager::find_files(input_dir, "srt")?;
    if files.is_empty() {
        warn!("No SRT files found in {}", input_dir.display());
        return Ok(());
    }

    info!("Found {} SRT files in {}", files.len(), input_dir.display());

    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    for file in &files {
        let target_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => file.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };

        match annotate_file(config, file, &target_dir, None, force_overwrite).await {
            Ok(Some(output)) => {
                success_count += 1;
                info!(
                    "Success: {} ({} markers)",
                    output.output_path.display(),
                    output.statistics.annotation_markers
                );
            }
            Ok(None) => skip_count += 1,
            Err(e) => match AppError::from(e) {
                // no file can succeed without a credential
                AppError::Config(ConfigError::MissingApiKey) => {
                    return Err(ConfigError::MissingApiKey.into());
                }
                e => {
                    error_count += 1;
                    error!("Error processing {}: {}", file.display(), e);
                }
            },
        }
    }

    info!(
        "Finished: {} annotated, {} skipped, {} failed",
        success_count, skip_count, error_count
    );

    Ok(())
}

fn print_statistics(statistics: &PipelineStatistics) {
    info!("Subtitle entries:     {}", statistics.subtitle_entries);
    info!("Tokens:               {}", statistics.total_tokens);
    info!("Difficult words:      {}", statistics.difficult_words);
    info!(
        "Translations:         {} unique ({} cached, {} requested, {} failed)",
        statistics.unique_translations,
        statistics.cached_translations,
        statistics.api_translations,
        statistics.failed_translations
    );
    info!("Annotation markers:   {}", statistics.annotation_markers);
}
