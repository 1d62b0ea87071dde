/*!
 * Lexical tokenization boundary.
 *
 * Tokenizers turn one subtitle line into an ordered list of [`Token`]s with
 * lemma, part of speech and an exact byte span into the line. Two
 * implementations are provided:
 * - `rules`: a deterministic built-in English tokenizer
 * - `external`: delegates to an external tagger process, one line per call
 */

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod external;
pub mod rules;

pub use external::ExternalTokenizer;
pub use rules::RuleTokenizer;

/// Coarse part-of-speech tag (Universal Dependencies tag set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adj,
    Adv,
    Propn,
    Pron,
    Det,
    Adp,
    Aux,
    Cconj,
    Sconj,
    Intj,
    Num,
    Part,
    Punct,
    Sym,
    X,
}

impl PartOfSpeech {
    /// Parse a tag name, anything unrecognised maps to `X`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "NOUN" => Self::Noun,
            "VERB" => Self::Verb,
            "ADJ" => Self::Adj,
            "ADV" => Self::Adv,
            "PROPN" => Self::Propn,
            "PRON" => Self::Pron,
            "DET" => Self::Det,
            "ADP" => Self::Adp,
            "AUX" => Self::Aux,
            "CCONJ" | "CONJ" => Self::Cconj,
            "SCONJ" => Self::Sconj,
            "INTJ" => Self::Intj,
            "NUM" => Self::Num,
            "PART" => Self::Part,
            "PUNCT" => Self::Punct,
            "SYM" => Self::Sym,
            _ => Self::X,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noun => "NOUN",
            Self::Verb => "VERB",
            Self::Adj => "ADJ",
            Self::Adv => "ADV",
            Self::Propn => "PROPN",
            Self::Pron => "PRON",
            Self::Det => "DET",
            Self::Adp => "ADP",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Sconj => "SCONJ",
            Self::Intj => "INTJ",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Punct => "PUNCT",
            Self::Sym => "SYM",
            Self::X => "X",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lexical token of one subtitle line.
///
/// `start..end` is a byte range into the owning line and always satisfies
/// `line[start..end] == text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form
    pub text: String,

    /// Dictionary form
    pub lemma: String,

    /// Coarse tag
    pub pos: PartOfSpeech,

    /// Fine-grained tag (tagger specific, may be empty)
    pub tag: String,

    pub is_stop: bool,
    pub is_punct: bool,
    pub is_alpha: bool,
    pub is_digit: bool,

    /// Byte offset of the first byte
    pub start: usize,

    /// Byte offset one past the last byte
    pub end: usize,
}

impl Token {
    /// Whether the span reproduces the token text in `line`
    pub fn span_matches(&self, line: &str) -> bool {
        line.get(self.start..self.end) == Some(self.text.as_str())
    }
}

/// Tokenizer collaborator, called once per subtitle line
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Split a line into tokens in left-to-right order
    async fn tokenize(&self, line: &str) -> Result<Vec<Token>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Keep only word tokens worth evaluating: alphabetic, not punctuation,
/// not numeric and at least two characters long.
pub fn clean_tokens(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| {
            !token.is_punct
                && !token.is_digit
                && token.is_alpha
                && token.text.chars().count() >= 2
        })
        .collect()
}
