use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::fmt::Write as _;
use std::path::Path;

use crate::annotation;
use crate::file_utils::FileManager;
use crate::subtitle_processor::SubtitleEntry;

// @module: Dual-track ASS rendering

// @const: UTF-8 byte-order mark written at the start of the document
const UTF8_BOM: &str = "\u{feff}";

// @const: Style names of the two tracks
pub const MAIN_STYLE_NAME: &str = "Main";
pub const RUBY_STYLE_NAME: &str = "Ruby";

/// ASS style record
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub fontname: String,
    pub fontsize: u32,
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub bold: i32,
    pub italic: i32,
    pub underline: i32,
    pub strikeout: i32,
    pub scale_x: u32,
    pub scale_y: u32,
    pub spacing: i32,
    pub angle: f32,
    pub border_style: u8,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad-style anchor (2 = bottom centre, 8 = top centre)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
    pub encoding: u8,
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            fontname: "Arial".to_string(),
            fontsize: 48,
            primary_color: "&H00FFFFFF".to_string(),
            secondary_color: "&H000000FF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H80000000".to_string(),
            bold: 0,
            italic: 0,
            underline: 0,
            strikeout: 0,
            scale_x: 100,
            scale_y: 100,
            spacing: 0,
            angle: 0.0,
            border_style: 1,
            outline: 2,
            shadow: 1,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }
}

impl AssStyle {
    /// Primary track: large white text anchored bottom centre
    pub fn main() -> Self {
        Self {
            name: MAIN_STYLE_NAME.to_string(),
            ..Self::default()
        }
    }

    /// Annotation track: small yellow text anchored top centre
    pub fn ruby() -> Self {
        Self {
            name: RUBY_STYLE_NAME.to_string(),
            fontname: "Hiragino Kaku Gothic Pro".to_string(),
            fontsize: 24,
            primary_color: "&H0000FFFF".to_string(),
            alignment: 8,
            ..Self::default()
        }
    }

    pub fn to_ass_line(&self) -> String {
        format!(
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.name,
            self.fontname,
            self.fontsize,
            self.primary_color,
            self.secondary_color,
            self.outline_color,
            self.back_color,
            self.bold,
            self.italic,
            self.underline,
            self.strikeout,
            self.scale_x,
            self.scale_y,
            self.spacing,
            self.angle,
            self.border_style,
            self.outline,
            self.shadow,
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.encoding
        )
    }
}

/// ASS dialogue event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssEvent {
    pub layer: u32,
    pub start: String,
    pub end: String,
    pub style: String,
    pub name: String,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
    pub effect: String,
    pub text: String,
}

impl AssEvent {
    pub fn new(layer: u32, start: String, end: String, style: &str, text: String) -> Self {
        Self {
            layer,
            start,
            end,
            style: style.to_string(),
            name: String::new(),
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            effect: String::new(),
            text,
        }
    }

    pub fn to_ass_line(&self) -> String {
        format!(
            "Dialogue: {},{},{},{},{},{:04},{:04},{:04},{},{}",
            self.layer,
            self.start,
            self.end,
            self.style,
            self.name,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text
        )
    }
}

/// Format milliseconds as an ASS timestamp `H:MM:SS.cc`.
/// Centiseconds are truncated, never rounded.
pub fn format_ass_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Event text for one subtitle line: line breaks become `\N`
fn event_text(text: &str) -> String {
    text.lines().map(str::trim_end).collect::<Vec<_>>().join("\\N")
}

/// Renders the primary track and the annotation track
#[derive(Debug, Clone)]
pub struct DualTrackRenderer {
    main_style: AssStyle,
    ruby_style: AssStyle,
    video_width: u32,
    video_height: u32,
}

impl DualTrackRenderer {
    pub fn new(video_width: u32, video_height: u32) -> Self {
        Self::with_styles(AssStyle::main(), AssStyle::ruby(), video_width, video_height)
    }

    /// Custom styles; track names are forced to `Main` and `Ruby`
    pub fn with_styles(mut main_style: AssStyle, mut ruby_style: AssStyle, video_width: u32, video_height: u32) -> Self {
        main_style.name = MAIN_STYLE_NAME.to_string();
        ruby_style.name = RUBY_STYLE_NAME.to_string();
        Self {
            main_style,
            ruby_style,
            video_width,
            video_height,
        }
    }

    /// Script info and style sections, up to the events format line
    pub fn header(&self) -> String {
        let mut header = String::new();
        header.push_str("[Script Info]\n");
        header.push_str("Title: Rubisub Generated Subtitles\n");
        header.push_str("ScriptType: v4.00+\n");
        header.push_str("WrapStyle: 0\n");
        header.push_str("ScaledBorderAndShadow: yes\n");
        header.push_str("YCbCr Matrix: None\n");
        let _ = writeln!(header, "PlayResX: {}", self.video_width);
        let _ = writeln!(header, "PlayResY: {}", self.video_height);
        header.push('\n');
        header.push_str("[V4+ Styles]\n");
        header.push_str("Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n");
        let _ = writeln!(header, "{}", self.main_style.to_ass_line());
        let _ = writeln!(header, "{}", self.ruby_style.to_ass_line());
        header.push('\n');
        header.push_str("[Events]\n");
        header.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
        header
    }

    /// Events for one entry: the primary event, then an annotation event
    /// when the line carries at least one marker
    pub fn events_for(&self, entry: &SubtitleEntry, annotated_text: &str) -> Vec<AssEvent> {
        let start = format_ass_timestamp(entry.start_time_ms);
        let end = format_ass_timestamp(entry.end_time_ms);

        let mut events = vec![AssEvent::new(
            0,
            start.clone(),
            end.clone(),
            MAIN_STYLE_NAME,
            event_text(&annotation::strip_markers(annotated_text)),
        )];

        let translations = annotation::extract_translations(annotated_text);
        if !translations.is_empty() {
            events.push(AssEvent::new(1, start, end, RUBY_STYLE_NAME, translations.join(" ")));
        }

        events
    }

    /// Whole document; `annotated` is parallel to `entries`
    pub fn render(&self, entries: &[SubtitleEntry], annotated: &[String]) -> Result<String> {
        if entries.len() != annotated.len() {
            return Err(anyhow!(
                "Entry count ({}) does not match annotated line count ({})",
                entries.len(),
                annotated.len()
            ));
        }

        let mut content = self.header();
        let mut event_count = 0;

        for (entry, text) in entries.iter().zip(annotated) {
            for event in self.events_for(entry, text) {
                content.push_str(&event.to_ass_line());
                content.push('\n');
                event_count += 1;
            }
        }

        debug!("Rendered {} events for {} entries", event_count, entries.len());
        Ok(content)
    }

    /// Render and write atomically, UTF-8 with BOM.
    /// The parent directory is created when missing.
    pub fn save<P: AsRef<Path>>(&self, path: P, entries: &[SubtitleEntry], annotated: &[String]) -> Result<()> {
        let path = path.as_ref();
        let content = self.render(entries, annotated)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                FileManager::ensure_dir(parent)?;
            }
        }

        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + content.len());
        bytes.extend_from_slice(UTF8_BOM.as_bytes());
        bytes.extend_from_slice(content.as_bytes());

        FileManager::write_atomic(path, &bytes)
            .with_context(|| format!("Failed to write ASS file: {}", path.display()))?;

        info!("Wrote {}", path.display());
        Ok(())
    }
}
