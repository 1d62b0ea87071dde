/*!
 * # Rubisub - inline glosses for English subtitles
 *
 * A Rust library that reads an SRT subtitle file, finds the words a learner
 * is likely to stumble on, translates them, and writes an ASS file with the
 * original line on one track and the glosses on a second track.
 *
 * ## Features
 *
 * - SRT loading with encoding detection
 * - Part-of-speech tagging with a built-in rule tagger or an external command
 * - Difficulty grading against NGSL, CEFR and frequency lists
 * - DeepL translation with a persistent word cache
 * - Inline `r{word|gloss}` markers spliced at exact byte offsets
 * - Dual-track ASS rendering
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and writing
 * - `nlp`: Tokenizers and part-of-speech tags
 * - `difficulty`: Lexical resources and the difficulty evaluator
 * - `translation`: Word translation service:
 *   - `translation::core`: Service and result types
 *   - `translation::cache`: Persistent translation cache
 *   - `translation::rate_limit`: Request spacing
 * - `providers`: Translation backend clients:
 *   - `providers::deepl`: DeepL API client
 * - `annotation`: Marker splicing and parsing
 * - `render`: ASS document generation
 * - `pipeline`: Stage orchestration
 * - `runner`: Background execution with progress events
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod annotation;
pub mod app_config;
pub mod difficulty;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod nlp;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod runner;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use pipeline::{PipelineConfig, PipelineOutput, PipelineProgress, PipelineStage, RubyPipeline};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use translation::TranslationService;
pub use errors::{AppError, ConfigError, ProviderError, SubtitleError};
