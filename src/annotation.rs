/*!
 * Inline annotation markers.
 *
 * A difficult word is replaced in its line by `r{original|translation}`.
 * Markers are spliced right to left so the byte offsets of spans still to
 * be processed stay valid. Delimiter characters are not escaped; a
 * candidate carrying one in either field is left unannotated.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use std::collections::HashSet;

use crate::difficulty::WordDifficulty;
use crate::nlp::Token;
use crate::translation::TranslationMap;

/// Opening of a marker
pub const MARKER_PREFIX: &str = "r{";

/// Separator between the original and the translation
pub const FIELD_SEPARATOR: char = '|';

/// End of a marker
pub const MARKER_CLOSE: char = '}';

static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"r\{([^{|}]+)\|([^{|}]+)\}").unwrap());

/// One annotation inside a line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationTag {
    /// Text of the annotated span
    pub original: String,

    /// Gloss shown for it
    pub translation: String,

    /// Byte offset of the span start
    pub start: usize,

    /// Byte offset one past the span end
    pub end: usize,
}

impl AnnotationTag {
    pub fn new(original: impl Into<String>, translation: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            original: original.into(),
            translation: translation.into(),
            start,
            end,
        }
    }

    /// Marker form, `r{original|translation}`
    pub fn to_marker(&self) -> String {
        format!("{}{}{}{}{}", MARKER_PREFIX, self.original, FIELD_SEPARATOR, self.translation, MARKER_CLOSE)
    }

    fn has_reserved_chars(&self) -> bool {
        let reserved = |s: &str| s.contains(['{', FIELD_SEPARATOR, MARKER_CLOSE]);
        reserved(&self.original) || reserved(&self.translation)
    }
}

/// A line after splicing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedLine {
    /// Text with markers
    pub text: String,

    /// Tags that were applied, right to left
    pub applied: Vec<AnnotationTag>,
}

/// Insert markers for `tags` into `line`.
pub fn splice(line: &str, tags: &[AnnotationTag]) -> String {
    splice_tags(line, tags).text
}

/// Insert markers and report which tags were applied.
///
/// Tags are applied by descending start offset. Identical spans are applied
/// once, a span overlapping one already applied is skipped, and so is a tag
/// whose span does not hold its original text or whose fields contain a
/// marker delimiter. The result does not depend on the order of `tags`.
pub fn splice_tags(line: &str, tags: &[AnnotationTag]) -> AnnotatedLine {
    let mut ordered: Vec<&AnnotationTag> = tags.iter().collect();
    ordered.sort_by(|a, b| {
        (Reverse(a.start), Reverse(a.end), &a.original, &a.translation)
            .cmp(&(Reverse(b.start), Reverse(b.end), &b.original, &b.translation))
    });

    let mut text = line.to_string();
    let mut applied = Vec::new();
    let mut seen_spans: HashSet<(usize, usize)> = HashSet::new();
    let mut left_bound = usize::MAX;

    for tag in ordered {
        if !seen_spans.insert((tag.start, tag.end)) {
            continue;
        }

        if line.get(tag.start..tag.end) != Some(tag.original.as_str()) || tag.start == tag.end {
            debug!("Skipping tag {:?}: span does not match the line", tag.original);
            continue;
        }

        if tag.translation.trim().is_empty() {
            continue;
        }

        if tag.has_reserved_chars() {
            warn!(
                "Not annotating '{}': marker delimiters in '{}' or '{}'",
                tag.original, tag.original, tag.translation
            );
            continue;
        }

        if tag.end > left_bound {
            debug!("Skipping tag {:?}: overlaps an applied span", tag.original);
            continue;
        }

        text.replace_range(tag.start..tag.end, &tag.to_marker());
        left_bound = tag.start;
        applied.push(tag.clone());
    }

    AnnotatedLine { text, applied }
}

/// Build tags for a line from its graded tokens and splice them in.
///
/// `tokens` and `difficulties` are parallel. Every flagged occurrence is
/// annotated; words without a valid translation stay untouched.
pub fn annotate_line(
    line: &str,
    tokens: &[Token],
    difficulties: &[WordDifficulty],
    translations: &TranslationMap,
) -> AnnotatedLine {
    let tags: Vec<AnnotationTag> = tokens
        .iter()
        .zip(difficulties)
        .filter(|(_, difficulty)| difficulty.needs_annotation)
        .filter_map(|(token, _)| {
            translations
                .lookup(&token.lemma, &token.text)
                .map(|translation| AnnotationTag::new(token.text.clone(), translation, token.start, token.end))
        })
        .collect();

    if tags.is_empty() {
        return AnnotatedLine {
            text: line.to_string(),
            applied: Vec::new(),
        };
    }

    splice_tags(line, &tags)
}

/// Markers found in a line; offsets refer to the marked text
pub fn parse_markers(text: &str) -> Vec<AnnotationTag> {
    MARKER_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(AnnotationTag::new(&caps[1], &caps[2], whole.start(), whole.end()))
        })
        .collect()
}

/// Replace every marker with its original text
pub fn strip_markers(text: &str) -> String {
    MARKER_REGEX.replace_all(text, "${1}").into_owned()
}

/// Replace every marker with its translation
pub fn translation_only(text: &str) -> String {
    MARKER_REGEX.replace_all(text, "${2}").into_owned()
}

/// Translations of all markers, left to right
pub fn extract_translations(text: &str) -> Vec<String> {
    MARKER_REGEX
        .captures_iter(text)
        .map(|caps| caps[2].to_string())
        .collect()
}

pub fn has_markers(text: &str) -> bool {
    MARKER_REGEX.is_match(text)
}

pub fn count_markers(text: &str) -> usize {
    MARKER_REGEX.find_iter(text).count()
}
