/*!
 * Tests for ASS rendering
 */

use anyhow::Result;
use rubisub::render::{self, AssStyle, DualTrackRenderer, MAIN_STYLE_NAME, RUBY_STYLE_NAME};
use rubisub::subtitle_processor::SubtitleEntry;
use crate::common;

fn sample_entries() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new(1, 1_239, 4_000, "The eloquent speaker impressed everyone.".to_string()),
        SubtitleEntry::new(2, 5_000, 9_999, "Thank you.".to_string()),
    ]
}

fn sample_annotated() -> Vec<String> {
    vec![
        "The r{eloquent|雄弁な} speaker r{impressed|感動させた} everyone.".to_string(),
        "Thank you.".to_string(),
    ]
}

#[test]
fn test_format_ass_timestamp_withVariousTimes_shouldTruncateCentiseconds() {
    assert_eq!(render::format_ass_timestamp(0), "0:00:00.00");
    assert_eq!(render::format_ass_timestamp(1_239), "0:00:01.23");
    assert_eq!(render::format_ass_timestamp(9_999), "0:00:09.99");
    assert_eq!(render::format_ass_timestamp(36_000_000), "10:00:00.00");
}

#[test]
fn test_render_withAnnotatedLines_shouldEmitBothTracks() -> Result<()> {
    let renderer = DualTrackRenderer::new(1920, 1080);

    let document = renderer.render(&sample_entries(), &sample_annotated())?;

    assert!(document.contains(
        "Dialogue: 0,0:00:01.23,0:00:04.00,Main,,0000,0000,0000,,The eloquent speaker impressed everyone."
    ));
    assert!(document.contains("Dialogue: 1,0:00:01.23,0:00:04.00,Ruby,,0000,0000,0000,,雄弁な 感動させた"));
    assert!(document.contains("Dialogue: 0,0:00:05.00,0:00:09.99,Main,,0000,0000,0000,,Thank you."));
    // unannotated line has no ruby event
    assert_eq!(document.matches(",Ruby,").count(), 1);
    Ok(())
}

#[test]
fn test_render_withHeader_shouldDeclareCanvasAndStyles() -> Result<()> {
    let renderer = DualTrackRenderer::new(1280, 720);

    let document = renderer.render(&[], &[])?;

    assert!(document.starts_with("[Script Info]\n"));
    assert!(document.contains("ScriptType: v4.00+"));
    assert!(document.contains("PlayResX: 1280\n"));
    assert!(document.contains("PlayResY: 720\n"));
    assert!(document.contains("[V4+ Styles]"));
    assert!(document.contains(&format!("Style: {},", MAIN_STYLE_NAME)));
    assert!(document.contains(&format!("Style: {},", RUBY_STYLE_NAME)));
    assert!(document.contains("[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n"));
    assert!(!document.contains("Dialogue:"));
    Ok(())
}

#[test]
fn test_render_withMismatchedLengths_shouldFail() {
    let renderer = DualTrackRenderer::new(1920, 1080);
    assert!(renderer.render(&sample_entries(), &[]).is_err());
}

#[test]
fn test_events_for_withMultiLineText_shouldJoinWithAssBreak() {
    let renderer = DualTrackRenderer::new(1920, 1080);
    let entry = SubtitleEntry::new(1, 0, 2_000, "First line\nSecond r{line|行}".to_string());

    let events = renderer.events_for(&entry, &entry.text);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].text, "First line\\NSecond line");
    assert_eq!(events[0].layer, 0);
    assert_eq!(events[1].text, "行");
    assert_eq!(events[1].style, RUBY_STYLE_NAME);
    assert_eq!(events[1].start, events[0].start);
    assert_eq!(events[1].end, events[0].end);
}

#[test]
fn test_with_styles_withCustomNames_shouldForceTrackNames() -> Result<()> {
    let main = AssStyle {
        name: "Custom".to_string(),
        fontsize: 60,
        ..AssStyle::main()
    };
    let renderer = DualTrackRenderer::with_styles(main, AssStyle::ruby(), 1920, 1080);

    let header = renderer.header();

    assert!(header.contains("Style: Main,Arial,60,"));
    assert!(!header.contains("Custom"));
    Ok(())
}

#[test]
fn test_save_withNestedOutputDir_shouldWriteBomAndCreateDirs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("out").join("nested").join("movie_ruby.ass");
    let renderer = DualTrackRenderer::new(1920, 1080);

    renderer.save(&output, &sample_entries(), &sample_annotated())?;

    let bytes = std::fs::read(&output)?;
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes[3..].to_vec())?;
    assert!(text.starts_with("[Script Info]"));
    assert_eq!(text.matches("Dialogue:").count(), 3);
    Ok(())
}

#[test]
fn test_save_withMismatchedLengths_shouldNotCreateFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("broken.ass");
    let renderer = DualTrackRenderer::new(1920, 1080);

    assert!(renderer.save(&output, &sample_entries(), &[]).is_err());
    assert!(!output.exists());
    Ok(())
}
