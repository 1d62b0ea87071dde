/*!
 * Persistent translation cache.
 *
 * A flat map from lowercase word to translation, loaded once when the
 * service is built and rewritten in full after every store. A missing or
 * unreadable file behaves like an empty cache. A single writer per file is
 * assumed; concurrent writers lose updates (last write wins).
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::file_utils::FileManager;

/// Translation cache backed by a JSON file
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<BTreeMap<String, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Backing file
    path: PathBuf,
}

impl TranslationCache {
    /// Open the cache stored at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = Self::read_entries(&path);
        debug!("Loaded {} cached translations from {}", entries.len(), path.display());

        Self {
            cache: Arc::new(RwLock::new(entries)),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            path,
        }
    }

    fn read_entries(path: &Path) -> BTreeMap<String, String> {
        if !path.exists() {
            return BTreeMap::new();
        }

        let parsed = FileManager::read_to_string(path)
            .and_then(|content| serde_json::from_str::<BTreeMap<String, String>>(&content).map_err(Into::into));

        match parsed {
            Ok(entries) => entries
                .into_iter()
                .map(|(word, translation)| (word.to_lowercase(), translation))
                .collect(),
            Err(e) => {
                warn!("Ignoring unreadable translation cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Get a translation from the cache (case-insensitive)
    pub fn get(&self, word: &str) -> Option<String> {
        let key = word.to_lowercase();
        let found = self.cache.read().get(&key).cloned();

        match &found {
            Some(_) => {
                *self.hits.write() += 1;
                debug!("Cache hit for '{}'", key);
            }
            None => {
                *self.misses.write() += 1;
                debug!("Cache miss for '{}'", key);
            }
        }

        found
    }

    /// Check for a word without touching the counters
    pub fn contains(&self, word: &str) -> bool {
        self.cache.read().contains_key(&word.to_lowercase())
    }

    /// Store a translation and flush the whole cache to disk
    pub fn store(&self, word: &str, translation: &str) -> Result<()> {
        self.cache.write().insert(word.to_lowercase(), translation.to_string());
        self.save()
    }

    /// Rewrite the backing file from the in-memory map
    pub fn save(&self) -> Result<()> {
        let json = {
            let cache = self.cache.read();
            serde_json::to_string_pretty(&*cache).context("Failed to serialize translation cache")?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                FileManager::ensure_dir(parent)?;
            }
        }

        FileManager::write_atomic(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to save translation cache: {}", self.path.display()))
    }

    /// Get cache statistics: (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Remove every entry and persist the empty cache
    pub fn clear(&self) -> Result<()> {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
        self.save()
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
            path: self.path.clone(),
        }
    }
}
