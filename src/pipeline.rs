/*!
 * Annotation pipeline orchestrator.
 *
 * Runs the fixed stage sequence
 * `load -> tokenize -> difficulty -> translate -> annotate -> render -> complete`
 * exactly once per run. Configuration is validated before anything is read
 * or written; any fault inside a stage aborts the run and reaches the caller
 * unchanged. Per-word translation failures are not faults.
 */

use anyhow::Result;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::annotation;
use crate::app_config::{Config, Locale};
use crate::difficulty::{DifficultyEvaluator, DifficultySettings, Lexicon, WordDifficulty};
use crate::errors::ConfigError;
use crate::file_utils::FileManager;
use crate::nlp::{self, ExternalTokenizer, RuleTokenizer, Token, Tokenizer};
use crate::render::DualTrackRenderer;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{TranslationMap, TranslationService};

/// Stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Load,
    Tokenize,
    Difficulty,
    Translate,
    Annotate,
    Render,
    Complete,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 7] = [
        Self::Load,
        Self::Tokenize,
        Self::Difficulty,
        Self::Translate,
        Self::Annotate,
        Self::Render,
        Self::Complete,
    ];

    /// 1-based position in the sequence
    pub fn position(self) -> usize {
        self as usize + 1
    }

    pub fn total() -> usize {
        Self::ALL.len()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Tokenize => "tokenize",
            Self::Difficulty => "difficulty",
            Self::Translate => "translate",
            Self::Annotate => "annotate",
            Self::Render => "render",
            Self::Complete => "complete",
        }
    }

    /// Status message shown when the stage starts
    pub fn message(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Self::Load) => "Loading subtitles…",
            (Locale::En, Self::Tokenize) => "Analyzing English words…",
            (Locale::En, Self::Difficulty) => "Evaluating difficulty…",
            (Locale::En, Self::Translate) => "Translating…",
            (Locale::En, Self::Annotate) => "Generating annotations…",
            (Locale::En, Self::Render) => "Writing ASS file…",
            (Locale::En, Self::Complete) => "Done!",
            (Locale::Ja, Self::Load) => "SRTを読み込み中…",
            (Locale::Ja, Self::Tokenize) => "英語の単語を解析中…",
            (Locale::Ja, Self::Difficulty) => "難易度を評価中…",
            (Locale::Ja, Self::Translate) => "DeepL翻訳中…",
            (Locale::Ja, Self::Annotate) => "ルビタグを生成中…",
            (Locale::Ja, Self::Render) => "ASSを生成中…",
            (Locale::Ja, Self::Complete) => "完了しました！",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Progress notification, emitted before a stage starts and during translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    /// 1-based stage position
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl PipelineProgress {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            current: stage.position(),
            total: PipelineStage::total(),
            message: message.into(),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64 * 100.0
        }
    }
}

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// Immutable per-run settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    // @field: Subtitle file to annotate
    pub input_path: PathBuf,

    // @field: Directory receiving the ASS file
    pub output_dir: PathBuf,

    // @field: Output file name, defaults to `<stem>_ruby.ass`
    pub output_filename: Option<String>,

    pub difficulty: DifficultySettings,

    // @field: Translation backend credential
    pub api_key: String,

    pub video_width: u32,
    pub video_height: u32,

    pub locale: Locale,
}

impl PipelineConfig {
    /// Per-run settings for one input file
    pub fn from_config(config: &Config, input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            output_filename: None,
            difficulty: DifficultySettings::from_config(config),
            api_key: config.translation.api_key.clone(),
            video_width: config.output.video_width,
            video_height: config.output.video_height,
            locale: config.locale,
        }
    }

    pub fn with_output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output_filename = Some(filename.into());
        self
    }

    /// Check everything a run needs, without touching the filesystem
    /// beyond an existence check
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInput);
        }

        if !self.input_path.exists() {
            return Err(ConfigError::InputNotFound(self.input_path.clone()));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }

        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(())
    }

    /// `output_dir/output_filename`, or `output_dir/<input stem>_ruby.ass`
    pub fn output_path(&self) -> PathBuf {
        match &self.output_filename {
            Some(name) if !name.is_empty() => self.output_dir.join(name),
            _ => FileManager::generate_output_path(&self.input_path, &self.output_dir, "_ruby", "ass"),
        }
    }
}

/// Aggregate numbers of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStatistics {
    pub subtitle_entries: usize,
    pub total_tokens: usize,
    pub difficult_words: usize,
    pub unique_translations: usize,
    pub cached_translations: usize,
    pub api_translations: usize,
    pub failed_translations: usize,
    pub annotation_markers: usize,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub output_path: PathBuf,
    pub statistics: PipelineStatistics,
}

/// Drives one subtitle file through every stage
pub struct RubyPipeline {
    config: PipelineConfig,
    tokenizer: Arc<dyn Tokenizer>,
    evaluator: DifficultyEvaluator,
    translator: Arc<TranslationService>,
    renderer: DualTrackRenderer,
    progress_callback: Option<ProgressCallback>,
    statistics: Option<PipelineStatistics>,
}

impl RubyPipeline {
    /// Build the default components from the application configuration
    pub fn from_app_config(config: PipelineConfig, app: &Config) -> Result<Self> {
        let tokenizer: Arc<dyn Tokenizer> = match &app.tokenizer.command {
            Some(command) if !command.is_empty() => Arc::new(ExternalTokenizer::new(command.clone())?),
            _ => Arc::new(RuleTokenizer::new()),
        };

        let lexicon = Lexicon::load(&app.lexicon)?;

        let mut translation = app.translation.clone();
        translation.api_key = config.api_key.clone();
        let translator = Arc::new(TranslationService::new(&translation)?);

        Ok(Self::with_components(config, tokenizer, lexicon, translator))
    }

    /// Build from explicit components
    pub fn with_components(
        config: PipelineConfig,
        tokenizer: Arc<dyn Tokenizer>,
        lexicon: Lexicon,
        translator: Arc<TranslationService>,
    ) -> Self {
        let evaluator = DifficultyEvaluator::with_settings(lexicon, config.difficulty.clone());
        let renderer = DualTrackRenderer::new(config.video_width, config.video_height);

        Self {
            config,
            tokenizer,
            evaluator,
            translator,
            renderer,
            progress_callback: None,
            statistics: None,
        }
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Statistics of the last successful run
    pub fn statistics(&self) -> Option<&PipelineStatistics> {
        self.statistics.as_ref()
    }

    fn report(&self, progress: PipelineProgress) {
        debug!("[{}/{}] {}: {}", progress.current, progress.total, progress.stage, progress.message);
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }

    fn enter(&self, stage: PipelineStage) {
        self.report(PipelineProgress::new(stage, stage.message(self.config.locale)));
    }

    /// Execute every stage once and write the output file
    pub async fn run(&mut self) -> Result<PipelineOutput> {
        self.config.validate()?;

        let started = Instant::now();
        let output_path = self.config.output_path();

        self.enter(PipelineStage::Load);
        let collection = SubtitleCollection::load(&self.config.input_path)?;
        info!("Loaded {} subtitle entries from {}", collection.len(), self.config.input_path.display());

        self.enter(PipelineStage::Tokenize);
        let line_tokens = self.tokenize(&collection).await?;

        self.enter(PipelineStage::Difficulty);
        let line_difficulties: Vec<Vec<WordDifficulty>> = line_tokens
            .iter()
            .map(|tokens| self.evaluator.evaluate_all(tokens))
            .collect();
        let words = Self::words_to_translate(&line_tokens, &line_difficulties);
        let all: Vec<WordDifficulty> = line_difficulties.iter().flatten().cloned().collect();
        let difficulty_stats = DifficultyEvaluator::statistics(&all);
        info!(
            "{} of {} words need annotation ({:.1}%)",
            difficulty_stats.words_needing_annotation,
            difficulty_stats.total_words,
            difficulty_stats.annotation_percentage
        );

        self.enter(PipelineStage::Translate);
        let calls_before = self.translator.external_calls();
        let translations = self.translate(&words).await;
        let api_translations = self.translator.external_calls() - calls_before;

        self.enter(PipelineStage::Annotate);
        let annotated: Vec<String> = collection
            .entries
            .iter()
            .zip(line_tokens.iter().zip(&line_difficulties))
            .map(|(entry, (tokens, difficulties))| {
                annotation::annotate_line(&entry.text, tokens, difficulties, &translations).text
            })
            .collect();
        let annotation_markers: usize = annotated.iter().map(|line| annotation::count_markers(line)).sum();

        self.enter(PipelineStage::Render);
        self.renderer.save(&output_path, &collection.entries, &annotated)?;

        let statistics = PipelineStatistics {
            subtitle_entries: collection.len(),
            total_tokens: line_tokens.iter().map(Vec::len).sum(),
            difficult_words: difficulty_stats.words_needing_annotation,
            unique_translations: translations.len(),
            cached_translations: translations.cached_count(),
            api_translations,
            failed_translations: translations.failed_count(),
            annotation_markers,
        };
        self.statistics = Some(statistics.clone());

        self.enter(PipelineStage::Complete);
        info!("Pipeline completed in {:.2?}: {}", started.elapsed(), output_path.display());

        Ok(PipelineOutput {
            output_path,
            statistics,
        })
    }

    async fn tokenize(&self, collection: &SubtitleCollection) -> Result<Vec<Vec<Token>>> {
        let mut line_tokens = Vec::with_capacity(collection.len());
        for entry in &collection.entries {
            let tokens = self.tokenizer.tokenize(&entry.text).await?;
            line_tokens.push(nlp::clean_tokens(tokens));
        }
        debug!("Tokenized {} lines with the {} tokenizer", line_tokens.len(), self.tokenizer.name());
        Ok(line_tokens)
    }

    /// Lowercase lemmas of flagged tokens, first-seen order
    fn words_to_translate(line_tokens: &[Vec<Token>], line_difficulties: &[Vec<WordDifficulty>]) -> Vec<String> {
        line_tokens
            .iter()
            .zip(line_difficulties)
            .flat_map(|(tokens, difficulties)| tokens.iter().zip(difficulties))
            .filter(|(_, difficulty)| difficulty.needs_annotation)
            .map(|(token, _)| token.lemma.to_lowercase())
            .collect()
    }

    async fn translate(&self, words: &[String]) -> TranslationMap {
        let locale = self.config.locale;
        let on_word = |current: usize, total: usize, word: &str| {
            let message = match locale {
                Locale::En => format!("Translating: {} ({}/{})", word, current, total),
                Locale::Ja => format!("翻訳中: {} ({}/{})", word, current, total),
            };
            self.report(PipelineProgress::new(PipelineStage::Translate, message));
        };

        self.translator.translate_batch(words, Some(&on_word)).await
    }
}

/// Run a pipeline for `input` with the application configuration
pub async fn run_pipeline(
    app: &Config,
    input: &Path,
    output_dir: &Path,
    progress_callback: Option<ProgressCallback>,
) -> Result<PipelineOutput> {
    let config = PipelineConfig::from_config(app, input, output_dir);
    config.validate()?;

    let mut pipeline = RubyPipeline::from_app_config(config, app)?;
    if let Some(callback) = progress_callback {
        pipeline.set_progress_callback(callback);
    }
    pipeline.run().await
}
