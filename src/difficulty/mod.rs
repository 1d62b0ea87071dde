/*!
 * Word difficulty evaluation.
 *
 * A token is graded against three lexical resources (core vocabulary tier,
 * proficiency band, corpus frequency rank) and flagged for annotation when
 * any one of them crosses its configured threshold.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::app_config::Config;
use crate::nlp::{PartOfSpeech, Token};

pub mod lexicon;

pub use lexicon::Lexicon;

/// Rank used when a word is absent from the frequency table
pub const UNRANKED: u32 = 999_999;

/// Tier of a word within the core vocabulary list (1 = most common)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoreVocabLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    /// Not in the list; ranks above every real tier
    NotListed = 99,
}

impl CoreVocabLevel {
    pub fn from_tier(tier: u8) -> Self {
        match tier {
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            _ => Self::NotListed,
        }
    }

    pub fn tier(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CoreVocabLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotListed => write!(f, "NOT_LISTED"),
            level => write!(f, "LEVEL_{}", level.tier()),
        }
    }
}

/// Proficiency band, beginner (A1) to mastery (C2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProficiencyLevel {
    A1 = 1,
    A2 = 2,
    B1 = 3,
    B2 = 4,
    C1 = 5,
    C2 = 6,
    /// Not categorised; ranks above every real band
    Unknown = 99,
}

impl ProficiencyLevel {
    pub fn tier(self) -> u8 {
        self as u8
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(format!("Invalid proficiency level: {}", other)),
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Grading of one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordDifficulty {
    pub word: String,
    pub lemma: String,
    pub core_vocab_level: CoreVocabLevel,
    pub proficiency_level: ProficiencyLevel,
    pub frequency_rank: u32,
    pub needs_annotation: bool,
    pub pos: PartOfSpeech,
}

/// Thresholds and admission filter applied by the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultySettings {
    pub ngsl_threshold: u8,
    pub cefr_threshold: ProficiencyLevel,
    pub frequency_threshold: u32,
    /// Admitted tags; empty admits everything
    pub pos_filter: HashSet<PartOfSpeech>,
    pub exclude_proper_nouns: bool,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            ngsl_threshold: 3,
            cefr_threshold: ProficiencyLevel::B1,
            frequency_threshold: 3000,
            pos_filter: [PartOfSpeech::Noun, PartOfSpeech::Verb].into_iter().collect(),
            exclude_proper_nouns: false,
        }
    }
}

impl DifficultySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ngsl_threshold: config.difficulty.ngsl_threshold,
            cefr_threshold: config.difficulty.cefr_threshold,
            frequency_threshold: config.difficulty.frequency_threshold,
            pos_filter: config.pos_filter.tags(),
            exclude_proper_nouns: config.pos_filter.exclude_proper_nouns,
        }
    }
}

/// Aggregate view over a set of gradings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DifficultyStatistics {
    pub total_words: usize,
    pub words_needing_annotation: usize,
    pub annotation_percentage: f64,
    pub core_vocab_distribution: BTreeMap<CoreVocabLevel, usize>,
    pub proficiency_distribution: BTreeMap<ProficiencyLevel, usize>,
}

/// Grades tokens against the lexicon
#[derive(Debug, Clone)]
pub struct DifficultyEvaluator {
    lexicon: Lexicon,
    settings: DifficultySettings,
}

impl DifficultyEvaluator {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            settings: DifficultySettings::default(),
        }
    }

    pub fn with_settings(lexicon: Lexicon, settings: DifficultySettings) -> Self {
        Self { lexicon, settings }
    }

    /// Replace thresholds and filter at runtime
    pub fn configure(&mut self, settings: DifficultySettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &DifficultySettings {
        &self.settings
    }

    pub fn set_frequency_threshold(&mut self, threshold: u32) {
        self.settings.frequency_threshold = threshold;
    }

    pub fn set_pos_filter(&mut self, pos_filter: HashSet<PartOfSpeech>) {
        self.settings.pos_filter = pos_filter;
    }

    pub fn core_vocab_level(&self, word: &str) -> CoreVocabLevel {
        self.lexicon
            .core_vocab
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(CoreVocabLevel::NotListed)
    }

    pub fn proficiency_level(&self, word: &str) -> ProficiencyLevel {
        self.lexicon
            .proficiency
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(ProficiencyLevel::Unknown)
    }

    pub fn frequency_rank(&self, word: &str) -> u32 {
        self.lexicon
            .frequency
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(UNRANKED)
    }

    /// Grade one token, looking up the lemma first and the surface form second
    pub fn evaluate(&self, token: &Token) -> WordDifficulty {
        let word = token.text.to_lowercase();
        let lemma = token.lemma.to_lowercase();

        let mut core_vocab_level = self.core_vocab_level(&lemma);
        if core_vocab_level == CoreVocabLevel::NotListed {
            core_vocab_level = self.core_vocab_level(&word);
        }

        let mut proficiency_level = self.proficiency_level(&lemma);
        if proficiency_level == ProficiencyLevel::Unknown {
            proficiency_level = self.proficiency_level(&word);
        }

        let frequency_rank = self.frequency_rank(&lemma).min(self.frequency_rank(&word));

        let needs_annotation = self.needs_annotation(token.pos, core_vocab_level, proficiency_level, frequency_rank);

        WordDifficulty {
            word: token.text.clone(),
            lemma: token.lemma.clone(),
            core_vocab_level,
            proficiency_level,
            frequency_rank,
            needs_annotation,
            pos: token.pos,
        }
    }

    fn needs_annotation(
        &self,
        pos: PartOfSpeech,
        core_vocab_level: CoreVocabLevel,
        proficiency_level: ProficiencyLevel,
        frequency_rank: u32,
    ) -> bool {
        let settings = &self.settings;

        if !settings.pos_filter.is_empty() && !settings.pos_filter.contains(&pos) {
            return false;
        }

        if settings.exclude_proper_nouns && pos == PartOfSpeech::Propn {
            return false;
        }

        if core_vocab_level == CoreVocabLevel::NotListed {
            return true;
        }

        core_vocab_level.tier() >= settings.ngsl_threshold
            || proficiency_level >= settings.cefr_threshold
            || frequency_rank >= settings.frequency_threshold
    }

    /// Grade every token independently, in order
    pub fn evaluate_all(&self, tokens: &[Token]) -> Vec<WordDifficulty> {
        tokens.iter().map(|token| self.evaluate(token)).collect()
    }

    pub fn statistics(difficulties: &[WordDifficulty]) -> DifficultyStatistics {
        let total_words = difficulties.len();
        let words_needing_annotation = difficulties.iter().filter(|d| d.needs_annotation).count();

        let mut stats = DifficultyStatistics {
            total_words,
            words_needing_annotation,
            annotation_percentage: if total_words > 0 {
                words_needing_annotation as f64 / total_words as f64 * 100.0
            } else {
                0.0
            },
            ..Default::default()
        };

        for d in difficulties {
            *stats.core_vocab_distribution.entry(d.core_vocab_level).or_insert(0) += 1;
            *stats.proficiency_distribution.entry(d.proficiency_level).or_insert(0) += 1;
        }

        debug!(
            "Difficulty statistics: {}/{} words need annotation",
            words_needing_annotation, total_words
        );

        stats
    }
}
