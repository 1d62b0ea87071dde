/*!
 * Core translation service implementation.
 *
 * `TranslationService` resolves single words through the persistent cache,
 * the rate limiter and the configured backend. Failures are captured per
 * word in `TranslationResult::error` and never abort a batch.
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::cache::TranslationCache;
use super::rate_limit::RateLimiter;
use crate::app_config::TranslationConfig;
use crate::errors::{ConfigError, ProviderError};
use crate::language_utils;
use crate::providers::{DeepL, TranslationBackend};

/// Outcome of resolving one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Word as requested
    pub source: String,

    /// Translation, empty on failure
    pub translation: String,

    /// Served from the cache
    pub cached: bool,

    /// Failure classification, if any
    pub error: Option<ProviderError>,
}

impl TranslationResult {
    fn success(source: &str, translation: String, cached: bool) -> Self {
        Self {
            source: source.to_string(),
            translation,
            cached,
            error: None,
        }
    }

    fn failure(source: &str, error: ProviderError) -> Self {
        Self {
            source: source.to_string(),
            translation: String::new(),
            cached: false,
            error: Some(error),
        }
    }

    /// No error and a non-empty translation
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && !self.translation.trim().is_empty()
    }
}

/// Batch results keyed by lowercase word, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct TranslationMap {
    results: HashMap<String, TranslationResult>,
    order: Vec<String>,
}

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, result: TranslationResult) {
        let key = word.to_lowercase();
        if self.results.insert(key.clone(), result).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, word: &str) -> Option<&TranslationResult> {
        self.results.get(&word.to_lowercase())
    }

    /// Valid translation for a token: the lemma first, then the surface form
    pub fn lookup(&self, lemma: &str, surface: &str) -> Option<&str> {
        [lemma, surface]
            .into_iter()
            .filter_map(|key| self.get(key))
            .find(|result| result.is_valid())
            .map(|result| result.translation.as_str())
    }

    /// Results in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TranslationResult)> {
        self.order
            .iter()
            .filter_map(|key| self.results.get(key).map(|result| (key.as_str(), result)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cached_count(&self) -> usize {
        self.results.values().filter(|r| r.cached).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| r.error.is_some()).count()
    }
}

/// Snapshot of the cache and call counters
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub cached_words: usize,
    pub cache_path: PathBuf,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    pub external_calls: usize,
}

/// Progress callback for batches: (position, total, word)
pub type BatchProgress<'a> = &'a (dyn Fn(usize, usize, &str) + Send + Sync);

/// Cached, rate-limited word translation service
pub struct TranslationService {
    backend: Arc<dyn TranslationBackend>,
    cache: TranslationCache,
    limiter: RateLimiter,
    source_language: String,
    target_language: String,
    external_calls: AtomicUsize,
}

impl TranslationService {
    /// Build the DeepL-backed service described by the configuration
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let cache = TranslationCache::load(config.get_cache_path());
        Self::with_backend(Arc::new(DeepL::from_config(config)?), cache, config)
    }

    /// Build a service around an arbitrary backend
    pub fn with_backend(
        backend: Arc<dyn TranslationBackend>,
        cache: TranslationCache,
        config: &TranslationConfig,
    ) -> Result<Self> {
        let source_language = language_utils::to_backend_code(&config.source_language)
            .map_err(|_| ConfigError::InvalidLanguage(config.source_language.clone()))?;
        let target_language = language_utils::to_backend_code(&config.target_language)
            .map_err(|_| ConfigError::InvalidLanguage(config.target_language.clone()))?;

        debug!(
            "Translation service using {} ({} -> {}), cache {}",
            backend.name(),
            source_language,
            target_language,
            cache.path().display()
        );

        Ok(Self {
            backend,
            cache,
            limiter: RateLimiter::new(Duration::from_millis(config.min_request_interval_ms)),
            source_language,
            target_language,
            external_calls: AtomicUsize::new(0),
        })
    }

    /// Resolve one word: cache, then credential check, then the backend
    pub async fn translate_word(&self, word: &str) -> TranslationResult {
        if let Some(cached) = self.cache.get(word).filter(|t| !t.is_empty()) {
            return TranslationResult::success(word, cached, true);
        }

        if !self.backend.has_credential() {
            return TranslationResult::failure(word, ProviderError::MissingApiKey);
        }

        self.limiter.acquire().await;
        self.external_calls.fetch_add(1, Ordering::SeqCst);

        match self
            .backend
            .translate(word, &self.source_language, &self.target_language)
            .await
        {
            Ok(translation) if !translation.trim().is_empty() => {
                if let Err(e) = self.cache.store(word, &translation) {
                    warn!("Could not persist translation of '{}': {:#}", word, e);
                }
                TranslationResult::success(word, translation, false)
            }
            Ok(_) => {
                warn!("Backend returned an empty translation for '{}'", word);
                TranslationResult::success(word, String::new(), false)
            }
            Err(e) => {
                warn!("Translation of '{}' failed ({}): {}", word, e.kind(), e);
                TranslationResult::failure(word, e)
            }
        }
    }

    /// Resolve many words sequentially.
    ///
    /// Input is deduplicated case-insensitively keeping first-seen order;
    /// `progress` is called after each unique word.
    pub async fn translate_batch<S: AsRef<str>>(
        &self,
        words: &[S],
        progress: Option<BatchProgress<'_>>,
    ) -> TranslationMap {
        let mut unique: Vec<String> = Vec::new();
        for word in words {
            let lower = word.as_ref().to_lowercase();
            if !lower.is_empty() && !unique.contains(&lower) {
                unique.push(lower);
            }
        }

        let total = unique.len();
        let mut results = TranslationMap::new();

        for (i, word) in unique.iter().enumerate() {
            let result = self.translate_word(word).await;
            results.insert(word, result);

            if let Some(callback) = progress {
                callback(i + 1, total, word);
            }
        }

        info!(
            "Translated {} unique words ({} cached, {} failed)",
            results.len(),
            results.cached_count(),
            results.failed_count()
        );

        results
    }

    /// Check the credential by translating a single test word
    pub async fn validate_api_key(&self) -> (bool, String) {
        if !self.backend.has_credential() {
            return (false, ProviderError::MissingApiKey.to_string());
        }

        self.limiter.acquire().await;
        self.external_calls.fetch_add(1, Ordering::SeqCst);

        match self
            .backend
            .translate("hello", &self.source_language, &self.target_language)
            .await
        {
            Ok(text) if !text.trim().is_empty() => (true, "API key is valid".to_string()),
            Ok(_) => (false, "No response from the translation API".to_string()),
            Err(e) => (false, e.to_string()),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let (hits, misses, hit_rate) = self.cache.stats();
        CacheStats {
            cached_words: self.cache.len(),
            cache_path: self.cache.path().to_path_buf(),
            hits,
            misses,
            hit_rate,
            external_calls: self.external_calls(),
        }
    }

    /// Number of requests actually handed to the backend
    pub fn external_calls(&self) -> usize {
        self.external_calls.load(Ordering::SeqCst)
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}
