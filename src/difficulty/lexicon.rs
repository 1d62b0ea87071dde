use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use super::{CoreVocabLevel, ProficiencyLevel};
use crate::app_config::LexiconConfig;

// @module: Lexical resource loading

/// The three word lists used to grade a token.
///
/// All keys are lowercase.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    // @field: Core-vocabulary tier per word
    pub core_vocab: HashMap<String, CoreVocabLevel>,

    // @field: Proficiency band per word
    pub proficiency: HashMap<String, ProficiencyLevel>,

    // @field: Frequency rank per word (1 = most common)
    pub frequency: HashMap<String, u32>,
}

impl Lexicon {
    /// Load every resource named by the configuration.
    /// Missing files are reported and leave that resource empty.
    pub fn load(config: &LexiconConfig) -> Result<Self> {
        let lexicon = Self {
            core_vocab: load_optional(&config.get_ngsl_path(), "NGSL", Self::load_core_vocab)?,
            proficiency: load_optional(&config.get_cefr_path(), "CEFR", Self::load_proficiency)?,
            frequency: load_optional(&config.get_frequency_path(), "frequency", Self::load_frequency)?,
        };

        info!(
            "Lexicon loaded: {} core vocabulary, {} proficiency, {} frequency entries",
            lexicon.core_vocab.len(),
            lexicon.proficiency.len(),
            lexicon.frequency.len()
        );

        Ok(lexicon)
    }

    /// Parse a `word,level` CSV; levels outside 1-3 count as not listed
    pub fn load_core_vocab(path: &Path) -> Result<HashMap<String, CoreVocabLevel>> {
        let mut reader = open_csv(path)?;
        let headers = reader.headers()?.clone();
        let word_idx = column(&headers, &["word"])
            .ok_or_else(|| anyhow!("Missing 'word' column in {}", path.display()))?;
        let level_idx = column(&headers, &["level"]);

        let mut map = HashMap::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
            let word = record.get(word_idx).unwrap_or_default().trim().to_lowercase();
            if word.is_empty() {
                continue;
            }

            let level = level_idx
                .and_then(|idx| record.get(idx))
                .and_then(|value| value.trim().parse::<u8>().ok())
                .map_or(CoreVocabLevel::NotListed, CoreVocabLevel::from_tier);
            map.insert(word, level);
        }

        Ok(map)
    }

    /// Parse a CEFR CSV with a `word` column and a `level` or `CEFR_level` column
    pub fn load_proficiency(path: &Path) -> Result<HashMap<String, ProficiencyLevel>> {
        let mut reader = open_csv(path)?;
        let headers = reader.headers()?.clone();
        let word_idx = column(&headers, &["word", "headword"])
            .ok_or_else(|| anyhow!("Missing 'word' column in {}", path.display()))?;
        let level_idx = column(&headers, &["level", "cefr_level", "cefr"]);

        let mut map = HashMap::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
            let word = record.get(word_idx).unwrap_or_default().trim().to_lowercase();
            if word.is_empty() {
                continue;
            }

            let level = level_idx
                .and_then(|idx| record.get(idx))
                .and_then(|value| value.parse::<ProficiencyLevel>().ok())
                .unwrap_or(ProficiencyLevel::Unknown);
            map.insert(word, level);
        }

        Ok(map)
    }

    /// Parse a frequency table.
    ///
    /// Accepted shapes: an object of integer ranks, an object of float scores
    /// (higher is more common, ranked by descending score), or an array of
    /// words in frequency order.
    pub fn load_frequency(path: &Path) -> Result<HashMap<String, u32>> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let value: Value = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse frequency data: {}", path.display()))?;

        Self::frequency_from_value(value)
    }

    pub fn frequency_from_value(value: Value) -> Result<HashMap<String, u32>> {
        match value {
            Value::Array(words) => {
                let words: Vec<String> = words
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|word| word.trim().to_lowercase())
                    .collect();

                // first occurrence wins
                Ok(words
                    .into_iter()
                    .enumerate()
                    .map(|(i, word)| (word, i as u32 + 1))
                    .rev()
                    .collect())
            }
            Value::Object(entries) => {
                if entries.values().all(|v| v.is_u64()) {
                    return Ok(entries
                        .iter()
                        .filter_map(|(word, rank)| Some((word.to_lowercase(), u32::try_from(rank.as_u64()?).ok()?)))
                        .collect());
                }

                let mut scored: Vec<(String, f64)> = entries
                    .iter()
                    .filter_map(|(word, score)| Some((word.to_lowercase(), score.as_f64()?)))
                    .collect();
                scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

                Ok(scored
                    .into_iter()
                    .enumerate()
                    .map(|(i, (word, _))| (word, i as u32 + 1))
                    .rev()
                    .collect())
            }
            _ => Err(anyhow!("Frequency data must be a JSON object or array")),
        }
    }
}

fn load_optional<T: Default>(path: &Path, label: &str, loader: fn(&Path) -> Result<T>) -> Result<T> {
    if !path.exists() {
        warn!("{} data file not found: {}", label, path.display());
        return Ok(T::default());
    }
    loader(path)
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.iter().any(|name| header.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name)))
}
