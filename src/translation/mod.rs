/*!
 * Word translation for annotations.
 *
 * - `core`: the translation service and its result types
 * - `cache`: persistent write-through translation cache
 * - `rate_limit`: minimum spacing between backend requests
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::core::{CacheStats, TranslationMap, TranslationResult, TranslationService};
pub use self::rate_limit::RateLimiter;

// Submodules
pub mod cache;
pub mod core;
pub mod rate_limit;
