/*!
 * Tests for application configuration
 */

use anyhow::Result;
use serde_json::json;
use rubisub::app_config::{merge_config, Config, Locale, LogLevel, TranslationConfig};
use rubisub::difficulty::ProficiencyLevel;
use rubisub::errors::ConfigError;
use rubisub::nlp::PartOfSpeech;
use crate::common;

#[test]
fn test_default_config_withNoOverrides_shouldUseDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.difficulty.ngsl_threshold, 3);
    assert_eq!(config.difficulty.cefr_threshold, ProficiencyLevel::B1);
    assert_eq!(config.difficulty.frequency_threshold, 3000);
    assert!(config.pos_filter.include_nouns);
    assert!(config.pos_filter.include_verbs);
    assert!(!config.pos_filter.include_adjectives);
    assert!(!config.pos_filter.exclude_proper_nouns);
    assert_eq!(config.translation.source_language, "en");
    assert_eq!(config.translation.target_language, "ja");
    assert_eq!(config.output.video_width, 1920);
    assert_eq!(config.output.video_height, 1080);
    assert_eq!(config.locale, Locale::En);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.tokenizer.command.is_none());
}

#[test]
fn test_merge_config_withPartialOverride_shouldKeepOtherDefaults() -> Result<()> {
    let overrides = json!({
        "difficulty": { "cefr_threshold": "B2" },
        "pos_filter": { "include_adjectives": true },
        "locale": "ja"
    });

    let config = merge_config(&Config::default(), overrides)?;

    assert_eq!(config.difficulty.cefr_threshold, ProficiencyLevel::B2);
    assert_eq!(config.difficulty.ngsl_threshold, 3);
    assert!(config.pos_filter.include_adjectives);
    assert!(config.pos_filter.include_nouns);
    assert_eq!(config.locale, Locale::Ja);
    Ok(())
}

#[test]
fn test_merge_config_withEmptyOverride_shouldEqualDefaults() -> Result<()> {
    let config = merge_config(&Config::default(), json!({}))?;
    assert_eq!(config, Config::default());
    Ok(())
}

#[test]
fn test_merge_config_withWrongType_shouldFail() {
    let result = merge_config(&Config::default(), json!({ "difficulty": { "frequency_threshold": "lots" } }));
    assert!(result.is_err());
}

#[test]
fn test_load_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load(&path)?;

    assert_eq!(config, Config::default());
    assert!(path.exists());
    let reloaded = Config::load(&path)?;
    assert_eq!(reloaded, config);
    Ok(())
}

#[test]
fn test_load_withPartialFile_shouldMergeOverDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"translation": {"api_key": "abc", "use_pro_api": true}, "output": {"video_width": 1280}}"#,
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.translation.api_key, "abc");
    assert_eq!(config.translation.get_endpoint(), "https://api.deepl.com/v2/translate");
    assert_eq!(config.translation.timeout_secs, 10);
    assert_eq!(config.output.video_width, 1280);
    assert_eq!(config.output.video_height, 1080);
    Ok(())
}

#[test]
fn test_load_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ nope")?;

    assert!(Config::load(&path).is_err());
    Ok(())
}

#[test]
fn test_get_endpoint_withOverride_shouldPreferOverride() {
    let mut config = TranslationConfig::default();
    assert_eq!(config.get_endpoint(), "https://api-free.deepl.com/v2/translate");

    config.endpoint = Some("http://localhost:8080/v2/translate".to_string());
    config.use_pro_api = true;
    assert_eq!(config.get_endpoint(), "http://localhost:8080/v2/translate");
}

#[test]
fn test_validate_withBadLanguage_shouldReturnConfigError() {
    let mut config = Config::default();
    config.translation.target_language = "xx".to_string();

    let error = config.validate().unwrap_err();

    assert_eq!(
        error.downcast_ref::<ConfigError>(),
        Some(&ConfigError::InvalidLanguage("xx".to_string()))
    );
}

#[test]
fn test_validate_withBadEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.endpoint = Some("not a url".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroThreshold_shouldFail() {
    let mut config = Config::default();
    config.difficulty.frequency_threshold = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_pos_filter_tags_withAllDisabled_shouldBeEmpty() {
    let mut config = Config::default();
    assert_eq!(
        config.pos_filter.tags(),
        [PartOfSpeech::Noun, PartOfSpeech::Verb].into_iter().collect()
    );

    config.pos_filter.include_nouns = false;
    config.pos_filter.include_verbs = false;
    assert!(config.pos_filter.tags().is_empty());
}

#[test]
fn test_lexicon_paths_withExplicitPaths_shouldUseThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lexicon = common::create_test_lexicon(temp_dir.path())?;

    assert_eq!(lexicon.get_ngsl_path(), temp_dir.path().join("ngsl.csv"));
    assert_eq!(lexicon.get_frequency_path(), temp_dir.path().join("frequency.json"));
    Ok(())
}

#[test]
fn test_log_level_to_level_filter_withDebug_shouldMap() {
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
}
