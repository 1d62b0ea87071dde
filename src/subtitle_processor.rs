use anyhow::{anyhow, Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::SubtitleError;

// @module: Subtitle loading and manipulation

// @const: SRT timing line, comma or period before the milliseconds
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: Block separator (a line holding only whitespace counts as blank)
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\f\v]*\n").unwrap());

/// Milliseconds for `H:MM:SS,mmm`; `None` when the hour field overflows
fn components_to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number (from the file, or synthesized from position)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Parse an SRT timestamp (`H:MM:SS,mmm` or `H:MM:SS.mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        components_to_ms(hours, minutes, seconds, millis)
            .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Display duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle entries with metadata
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Entries in order of appearance in the source
    pub entries: Vec<SubtitleEntry>,

    /// Name of the encoding the file was decoded with
    pub encoding: String,
}

impl SubtitleCollection {
    /// Create an empty subtitle collection
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            encoding: UTF_8.name().to_string(),
        }
    }

    /// Load and parse an SRT file.
    ///
    /// The encoding is detected from the raw bytes; undecodable sequences are
    /// replaced rather than aborting the read. Malformed blocks are dropped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SubtitleError::NotFound(path.to_path_buf()).into());
        }

        let bytes = std::fs::read(path).map_err(|e| SubtitleError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (content, encoding) = Self::decode_bytes(&bytes);
        debug!("Decoded {} as {}", path.display(), encoding.name());

        let entries = Self::parse_srt_string(&content);
        if entries.is_empty() {
            warn!("No valid subtitle entries found in {}", path.display());
        }

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
            encoding: encoding.name().to_string(),
        })
    }

    /// Guess the text encoding of raw bytes.
    ///
    /// A byte-order mark wins, then valid UTF-8, then a statistical guess.
    pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            return encoding;
        }

        if std::str::from_utf8(bytes).is_ok() {
            return UTF_8;
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    }

    /// Decode raw bytes with the detected encoding, replacing malformed sequences
    pub fn decode_bytes(bytes: &[u8]) -> (String, &'static Encoding) {
        let encoding = Self::detect_encoding(bytes);
        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!("Malformed {} sequences were replaced while decoding", used.name());
        }
        (text.into_owned(), used)
    }

    /// Parse SRT format string into subtitle entries.
    ///
    /// Blocks without a timing line, without text, or whose end precedes
    /// their start are skipped.
    pub fn parse_srt_string(content: &str) -> Vec<SubtitleEntry> {
        let normalized = content
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        let mut entries: Vec<SubtitleEntry> = Vec::new();

        for block in BLOCK_SEPARATOR.split(normalized.trim()) {
            if block.trim().is_empty() {
                continue;
            }

            match Self::parse_block(block, entries.len() + 1) {
                Some(entry) => entries.push(entry),
                None => debug!("Dropping malformed subtitle block: {:?}", block),
            }
        }

        entries
    }

    fn parse_block(block: &str, position: usize) -> Option<SubtitleEntry> {
        let lines: Vec<&str> = block.trim().split('\n').collect();
        if lines.len() < 2 {
            return None;
        }

        let mut index: Option<usize> = None;
        let mut timing: Option<(usize, u64, u64)> = None;

        for (i, line) in lines.iter().enumerate() {
            let line = line.trim();

            if let Some(caps) = TIMING_REGEX.captures(line) {
                let start = Self::parse_timestamp_to_ms(&caps, 1)?;
                let end = Self::parse_timestamp_to_ms(&caps, 5)?;
                timing = Some((i, start, end));
                break;
            }

            if index.is_none() && !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()) {
                index = line.parse().ok();
            }
        }

        let (timing_idx, start_time_ms, end_time_ms) = timing?;
        if end_time_ms < start_time_ms {
            return None;
        }

        let text = lines[timing_idx + 1..]
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return None;
        }

        Some(SubtitleEntry::new(
            index.unwrap_or(position),
            start_time_ms,
            end_time_ms,
            text,
        ))
    }

    /// Parse one captured timestamp (4 groups starting at `start_idx`)
    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let field = |offset: usize| -> Option<u64> { caps.get(start_idx + offset)?.as_str().parse().ok() };

        let hours = field(0)?;
        let minutes = field(1)?;
        let seconds = field(2)?;
        let millis = field(3)?;

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        components_to_ms(hours, minutes, seconds, millis)
    }

    /// Write subtitles to an SRT file, numbered from 1
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for (i, entry) in self.entries.iter().enumerate() {
            let renumbered = SubtitleEntry {
                seq_num: i + 1,
                ..entry.clone()
            };
            write!(file, "{}", renumbered)?;
        }

        Ok(())
    }

    /// End time of the last entry, in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.last().map_or(0, |entry| entry.end_time_ms)
    }

    /// Subtitle texts without timing information
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Encoding: {}", self.encoding)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
