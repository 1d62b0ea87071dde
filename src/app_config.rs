use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::difficulty::ProficiencyLevel;
use crate::errors::ConfigError;
use crate::file_utils::FileManager;
use crate::nlp::PartOfSpeech;

/// Application configuration module
/// This module handles the application configuration including loading,
/// merging with defaults, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Difficulty thresholds
    #[serde(default)]
    pub difficulty: DifficultyConfig,

    /// Part-of-speech admission filter
    #[serde(default)]
    pub pos_filter: PosFilterConfig,

    /// Translation backend settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Lexical resource locations
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Output canvas settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Tokenizer selection
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Language of progress messages
    #[serde(default)]
    pub locale: Locale,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Thresholds at or above which a word is considered difficult
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DifficultyConfig {
    // @field: NGSL tier threshold (1-3, words outside the list always qualify)
    #[serde(default = "default_ngsl_threshold")]
    pub ngsl_threshold: u8,

    // @field: CEFR band threshold
    #[serde(default = "default_cefr_threshold")]
    pub cefr_threshold: ProficiencyLevel,

    // @field: Frequency rank threshold
    #[serde(default = "default_frequency_threshold")]
    pub frequency_threshold: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            ngsl_threshold: default_ngsl_threshold(),
            cefr_threshold: default_cefr_threshold(),
            frequency_threshold: default_frequency_threshold(),
        }
    }
}

/// Which parts of speech may receive an annotation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PosFilterConfig {
    #[serde(default = "default_true")]
    pub include_nouns: bool,

    #[serde(default = "default_true")]
    pub include_verbs: bool,

    #[serde(default)]
    pub include_adjectives: bool,

    #[serde(default)]
    pub include_adverbs: bool,

    /// Never annotate proper nouns
    #[serde(default)]
    pub exclude_proper_nouns: bool,
}

impl Default for PosFilterConfig {
    fn default() -> Self {
        Self {
            include_nouns: true,
            include_verbs: true,
            include_adjectives: false,
            include_adverbs: false,
            exclude_proper_nouns: false,
        }
    }
}

impl PosFilterConfig {
    /// Set of admitted tags; empty means every tag is admitted
    pub fn tags(&self) -> HashSet<PartOfSpeech> {
        let mut tags = HashSet::new();
        if self.include_nouns {
            tags.insert(PartOfSpeech::Noun);
        }
        if self.include_verbs {
            tags.insert(PartOfSpeech::Verb);
        }
        if self.include_adjectives {
            tags.insert(PartOfSpeech::Adj);
        }
        if self.include_adverbs {
            tags.insert(PartOfSpeech::Adv);
        }
        tags
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// DeepL authentication key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Use the paid endpoint instead of the free one
    #[serde(default)]
    pub use_pro_api: bool,

    /// Explicit endpoint URL, overrides `use_pro_api`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum spacing between two outbound requests in milliseconds
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Location of the persistent translation cache
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            use_pro_api: false,
            endpoint: None,
            source_language: default_source_language(),
            target_language: default_target_language(),
            timeout_secs: default_timeout_secs(),
            min_request_interval_ms: default_min_request_interval_ms(),
            cache_path: None,
        }
    }
}

impl TranslationConfig {
    /// Get the endpoint the client should post to
    pub fn get_endpoint(&self) -> String {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.is_empty() {
                return endpoint.clone();
            }
        }

        if self.use_pro_api {
            default_pro_endpoint()
        } else {
            default_free_endpoint()
        }
    }

    /// Resolved cache file location
    pub fn get_cache_path(&self) -> PathBuf {
        FileManager::resolve_data_path(self.cache_path.as_deref(), "translation_cache.json")
    }
}

/// Locations of the three lexical resources
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LexiconConfig {
    #[serde(default)]
    pub ngsl_path: Option<PathBuf>,

    #[serde(default)]
    pub cefr_path: Option<PathBuf>,

    #[serde(default)]
    pub frequency_path: Option<PathBuf>,
}

impl LexiconConfig {
    pub fn get_ngsl_path(&self) -> PathBuf {
        FileManager::resolve_data_path(self.ngsl_path.as_deref(), "ngsl.csv")
    }

    pub fn get_cefr_path(&self) -> PathBuf {
        FileManager::resolve_data_path(self.cefr_path.as_deref(), "cefr.csv")
    }

    pub fn get_frequency_path(&self) -> PathBuf {
        FileManager::resolve_data_path(self.frequency_path.as_deref(), "frequency.json")
    }
}

/// Output document settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_video_width")]
    pub video_width: u32,

    #[serde(default = "default_video_height")]
    pub video_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video_width: default_video_width(),
            video_height: default_video_height(),
        }
    }
}

/// Tokenizer selection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TokenizerConfig {
    /// External tagger command line (program followed by arguments).
    /// The built-in rule tokenizer is used when absent.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// Language used for progress messages
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
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

fn default_ngsl_threshold() -> u8 {
    3
}

fn default_cefr_threshold() -> ProficiencyLevel {
    ProficiencyLevel::B1
}

fn default_frequency_threshold() -> u32 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ja".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_request_interval_ms() -> u64 {
    50
}

fn default_video_width() -> u32 {
    1920
}

fn default_video_height() -> u32 {
    1080
}

fn default_free_endpoint() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_pro_endpoint() -> String {
    "https://api.deepl.com/v2/translate".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values.
    ///
    /// The credential is not checked here; a run-specific check happens
    /// in `PipelineConfig::validate`.
    pub fn validate(&self) -> Result<()> {
        for code in [&self.translation.source_language, &self.translation.target_language] {
            crate::language_utils::get_language_name(code)
                .map_err(|_| ConfigError::InvalidLanguage(code.clone()))?;
        }

        if let Some(endpoint) = &self.translation.endpoint {
            url::Url::parse(endpoint)
                .map_err(|_| ConfigError::InvalidEndpoint(endpoint.clone()))?;
        }

        if self.difficulty.ngsl_threshold == 0 {
            return Err(ConfigError::InvalidThreshold("ngsl_threshold must be at least 1".to_string()).into());
        }

        if self.difficulty.frequency_threshold == 0 {
            return Err(ConfigError::InvalidThreshold("frequency_threshold must be at least 1".to_string()).into());
        }

        if self.output.video_width == 0 || self.output.video_height == 0 {
            return Err(anyhow!("Output canvas dimensions must be non-zero"));
        }

        Ok(())
    }

    /// Load a configuration file merged over the defaults.
    /// A missing file yields the defaults, which are written to `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            FileManager::write_to_file(path, &config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            return Ok(config);
        }

        let content = FileManager::read_to_string(path)?;
        let overrides: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        merge_config(&Config::default(), overrides)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DifficultyConfig::default(),
            pos_filter: PosFilterConfig::default(),
            translation: TranslationConfig::default(),
            lexicon: LexiconConfig::default(),
            output: OutputConfig::default(),
            tokenizer: TokenizerConfig::default(),
            locale: Locale::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Build a configuration from `defaults` with `overrides` laid on top.
///
/// Objects merge key by key, any other value replaces the default.
pub fn merge_config(defaults: &Config, overrides: Value) -> Result<Config> {
    let mut merged = serde_json::to_value(defaults).context("Failed to serialize default config")?;
    merge_values(&mut merged, overrides);
    serde_json::from_value(merged).context("Merged configuration is invalid")
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
