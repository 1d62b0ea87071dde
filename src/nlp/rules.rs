use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::{PartOfSpeech, Token, Tokenizer};

// @module: Built-in rule-based English tokenizer

// @const: Words, numbers, then any other single non-space character
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{L}+(?:['’]\p{L}+)*|\d+(?:[.,:]\d+)*|\S").unwrap()
});

static DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "no", "every", "each", "all", "both", "another", "either", "neither",
];

static PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself", "yourself",
    "himself", "herself", "itself", "ourselves", "themselves", "who", "whom", "what", "which",
    "something", "someone", "somebody", "anything", "anyone", "anybody", "nothing", "nobody",
    "everyone", "everything", "everybody", "mine", "yours", "hers", "ours", "theirs",
];

static ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "from", "up", "down", "of", "off", "over",
    "under", "around", "near", "without", "within", "across", "behind", "beyond", "like",
    "toward", "towards", "upon", "onto", "among",
];

static AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];

static MODALS: &[&str] = &["will", "would", "shall", "should", "can", "could", "may", "might", "must"];

static COORDINATORS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];

static SUBORDINATORS: &[&str] = &[
    "if", "because", "although", "though", "while", "unless", "until", "whether", "whereas",
    "than", "since", "as", "once",
];

static PARTICLES: &[&str] = &["not", "to", "n't", "'s"];

static INTERJECTIONS: &[&str] = &[
    "oh", "wow", "hey", "hello", "hi", "yes", "okay", "ok", "yeah", "ah", "uh", "um", "oops",
    "bye", "goodbye", "huh", "hmm",
];

static NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "twenty", "thirty", "hundred", "thousand", "million",
];

static EXTRA_STOP_WORDS: &[&str] = &[
    "there", "here", "then", "now", "just", "very", "too", "also", "only", "how", "when", "where",
    "why", "more", "most", "such", "own", "same", "other", "again", "out", "don", "get", "go",
];

static SUBJECT_PRONOUNS: &[&str] = &["i", "you", "we", "they", "he", "she"];

// @const: Adjectives ending in -ly
static LY_ADJECTIVES: &[&str] = &[
    "holy", "ugly", "lovely", "friendly", "lonely", "likely", "early", "daily", "silly",
];

// @const: Nouns and verbs ending in -ly, left to the remaining suffix rules
static LY_NOUNS_VERBS: &[&str] = &[
    "family", "supply", "reply", "apply", "rely", "fly", "ally", "italy", "july", "belly",
    "jelly", "bully", "lily",
];

static IRREGULAR_LEMMAS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"),
        ("has", "have"), ("had", "have"), ("does", "do"), ("did", "do"), ("done", "do"),
        ("went", "go"), ("gone", "go"), ("said", "say"), ("made", "make"), ("took", "take"),
        ("taken", "take"), ("came", "come"), ("saw", "see"), ("seen", "see"), ("got", "get"),
        ("gotten", "get"), ("gave", "give"), ("given", "give"), ("knew", "know"),
        ("known", "know"), ("thought", "think"), ("told", "tell"), ("found", "find"),
        ("left", "leave"), ("felt", "feel"), ("brought", "bring"), ("bought", "buy"),
        ("kept", "keep"), ("began", "begin"), ("begun", "begin"), ("ran", "run"),
        ("wrote", "write"), ("written", "write"), ("spoke", "speak"), ("spoken", "speak"),
        ("ate", "eat"), ("eaten", "eat"), ("drove", "drive"), ("driven", "drive"),
        ("chose", "choose"), ("chosen", "choose"), ("forgot", "forget"),
        ("forgotten", "forget"), ("men", "man"), ("women", "woman"), ("children", "child"),
        ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("people", "person"),
        ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
    ]
    .into_iter()
    .collect()
});

static CLOSED_CLASSES: Lazy<Vec<(PartOfSpeech, HashSet<&'static str>)>> = Lazy::new(|| {
    [
        (PartOfSpeech::Pron, PRONOUNS),
        (PartOfSpeech::Det, DETERMINERS),
        (PartOfSpeech::Aux, AUXILIARIES),
        (PartOfSpeech::Part, PARTICLES),
        (PartOfSpeech::Adp, ADPOSITIONS),
        (PartOfSpeech::Cconj, COORDINATORS),
        (PartOfSpeech::Sconj, SUBORDINATORS),
        (PartOfSpeech::Intj, INTERJECTIONS),
        (PartOfSpeech::Num, NUMBER_WORDS),
    ]
    .into_iter()
    .map(|(pos, words)| (pos, words.iter().copied().collect()))
    .collect()
});

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    CLOSED_CLASSES
        .iter()
        .flat_map(|(_, words)| words.iter().copied())
        .chain(EXTRA_STOP_WORDS.iter().copied())
        .collect()
});

/// Deterministic English tokenizer with heuristic tagging.
///
/// Tagging order: punctuation and numbers, closed-class word lists,
/// capitalised words away from a sentence start (proper nouns), words after
/// a modal, `to` or a subject pronoun (verbs), suffix rules, then nouns.
#[derive(Debug, Default, Clone)]
pub struct RuleTokenizer;

impl RuleTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize a single line synchronously
    pub fn tokenize_line(&self, line: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut sentence_start = true;
        let mut previous_word: Option<String> = None;

        for m in TOKEN_REGEX.find_iter(line) {
            let text = m.as_str();
            let lower = text.to_lowercase();
            let is_alpha = text.chars().all(char::is_alphabetic);
            let is_digit = text.chars().all(|c| c.is_ascii_digit());
            let is_punct = text.chars().count() == 1 && is_punctuation(text);

            let pos = if is_punct {
                PartOfSpeech::Punct
            } else if text.chars().count() == 1 && !text.chars().all(char::is_alphanumeric) {
                PartOfSpeech::Sym
            } else if text.starts_with(|c: char| c.is_ascii_digit()) {
                PartOfSpeech::Num
            } else {
                classify_word(text, &lower, sentence_start, previous_word.as_deref())
            };

            let lemma = lemmatize(text, &lower, pos);
            let tag = fine_tag(&lower, &lemma, pos);

            tokens.push(Token {
                text: text.to_string(),
                lemma,
                pos,
                tag,
                is_stop: STOP_WORDS.contains(lower.as_str()),
                is_punct,
                is_alpha,
                is_digit,
                start: m.start(),
                end: m.end(),
            });

            if is_punct {
                sentence_start = matches!(text, "." | "!" | "?" | "-");
                if sentence_start {
                    previous_word = None;
                }
            } else {
                sentence_start = false;
                previous_word = Some(lower);
            }
        }

        tokens
    }
}

#[async_trait]
impl Tokenizer for RuleTokenizer {
    async fn tokenize(&self, line: &str) -> Result<Vec<Token>> {
        Ok(self.tokenize_line(line))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

fn is_punctuation(text: &str) -> bool {
    text.chars().all(|c| {
        (c.is_ascii_punctuation() && !"$%+=<>^~|#&*@\\`".contains(c))
            || matches!(c, '…' | '“' | '”' | '‘' | '’' | '—' | '–' | '«' | '»' | '¿' | '¡')
    })
}

fn classify_word(text: &str, lower: &str, sentence_start: bool, previous: Option<&str>) -> PartOfSpeech {
    for (pos, words) in CLOSED_CLASSES.iter() {
        if words.contains(lower) {
            return *pos;
        }
    }

    if !sentence_start && text.starts_with(char::is_uppercase) {
        return PartOfSpeech::Propn;
    }

    if let Some(prev) = previous {
        if MODALS.contains(&prev) || prev == "to" || SUBJECT_PRONOUNS.contains(&prev) {
            return PartOfSpeech::Verb;
        }
    }

    classify_by_suffix(lower)
}

fn classify_by_suffix(lower: &str) -> PartOfSpeech {
    let len = lower.chars().count();

    if LY_ADJECTIVES.contains(&lower) {
        return PartOfSpeech::Adj;
    }

    if len > 4 && lower.ends_with("ly") && !LY_NOUNS_VERBS.contains(&lower) {
        return PartOfSpeech::Adv;
    }

    const ADJ_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"];
    if len > 5 && ADJ_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        return PartOfSpeech::Adj;
    }

    const VERB_SUFFIXES: &[&str] = &["ing", "ed", "ize", "ise", "ify"];
    if len > 4 && VERB_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        return PartOfSpeech::Verb;
    }

    PartOfSpeech::Noun
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Repair a stem left by removing -ing/-ed: undouble a final consonant
/// (`runn` -> `run`) or restore a silent e on short consonant-vowel-consonant
/// stems (`mak` -> `make`).
fn repair_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();

    if n >= 3 && chars[n - 1] == chars[n - 2] && !is_vowel(chars[n - 1]) && !matches!(chars[n - 1], 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }

    if n == 3 && !is_vowel(chars[0]) && is_vowel(chars[1]) && !is_vowel(chars[2]) && !matches!(chars[2], 'w' | 'x' | 'y') {
        return format!("{}e", stem);
    }

    stem.to_string()
}

fn strip_plural(lower: &str) -> String {
    if lower.len() > 4 && lower.ends_with("ies") {
        return format!("{}y", &lower[..lower.len() - 3]);
    }
    for sibilant in ["ses", "xes", "zes", "ches", "shes"] {
        if lower.len() > sibilant.len() + 1 && lower.ends_with(sibilant) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is") {
        return lower[..lower.len() - 1].to_string();
    }
    lower.to_string()
}

/// Suffix-stripping lemmatiser with an irregular-form table
fn lemmatize(text: &str, lower: &str, pos: PartOfSpeech) -> String {
    if pos == PartOfSpeech::Propn {
        return text.to_string();
    }

    if let Some(lemma) = IRREGULAR_LEMMAS.get(lower) {
        return (*lemma).to_string();
    }

    if !lower.is_ascii() {
        return lower.to_string();
    }

    match pos {
        PartOfSpeech::Verb => {
            if lower.len() > 4 && lower.ends_with("ied") {
                return format!("{}y", &lower[..lower.len() - 3]);
            }
            if lower.len() > 5 && lower.ends_with("ing") {
                return repair_stem(&lower[..lower.len() - 3]);
            }
            if lower.len() > 4 && lower.ends_with("ed") {
                if lower.ends_with("eed") {
                    return lower[..lower.len() - 1].to_string();
                }
                return repair_stem(&lower[..lower.len() - 2]);
            }
            strip_plural(lower)
        }
        PartOfSpeech::Noun => strip_plural(lower),
        _ => lower.to_string(),
    }
}

fn fine_tag(lower: &str, lemma: &str, pos: PartOfSpeech) -> String {
    let tag = match pos {
        PartOfSpeech::Noun if lower != lemma => "NNS",
        PartOfSpeech::Noun => "NN",
        PartOfSpeech::Propn => "NNP",
        PartOfSpeech::Verb if lower.ends_with("ing") => "VBG",
        PartOfSpeech::Verb if lower.ends_with("ed") || (lower != lemma && !lower.ends_with('s')) => "VBD",
        PartOfSpeech::Verb if lower != lemma => "VBZ",
        PartOfSpeech::Verb => "VB",
        PartOfSpeech::Aux if MODALS.contains(&lower) => "MD",
        PartOfSpeech::Aux => "VB",
        PartOfSpeech::Adj => "JJ",
        PartOfSpeech::Adv => "RB",
        PartOfSpeech::Pron => "PRP",
        PartOfSpeech::Det => "DT",
        PartOfSpeech::Adp => "IN",
        PartOfSpeech::Cconj => "CC",
        PartOfSpeech::Sconj => "IN",
        PartOfSpeech::Intj => "UH",
        PartOfSpeech::Num => "CD",
        PartOfSpeech::Part => "RP",
        PartOfSpeech::Punct => ".",
        PartOfSpeech::Sym => "SYM",
        PartOfSpeech::X => "XX",
    };
    tag.to_string()
}
