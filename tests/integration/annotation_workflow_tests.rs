/*!
 * Integration tests for the full annotation workflow
 */

use std::path::Path;
use std::sync::{Arc, Mutex};
use anyhow::Result;

use rubisub::app_config::Config;
use rubisub::errors::{ConfigError, ProviderError, SubtitleError};
use rubisub::nlp::{RuleTokenizer, Tokenizer};
use rubisub::pipeline::{PipelineConfig, PipelineProgress, PipelineStage, RubyPipeline};
use crate::common::{self, MockBackend};

/// Build a pipeline over the rule tokenizer, the fixture lexicon and `backend`
fn build_pipeline(dir: &Path, input: &Path, output_dir: &Path, backend: Arc<MockBackend>) -> Result<RubyPipeline> {
    let config = common::test_config(dir)?;
    let pipeline_config = PipelineConfig::from_config(&config, input, output_dir);
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(RuleTokenizer::new());
    let lexicon = common::load_test_lexicon(dir)?;
    let service = Arc::new(common::create_service(backend, dir)?);

    Ok(RubyPipeline::with_components(pipeline_config, tokenizer, lexicon, service))
}

fn read_ass(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8(bytes)?.trim_start_matches('\u{feff}').to_string())
}

#[tokio::test]
async fn test_pipeline_withEloquentSubtitle_shouldAnnotateOnlyDifficultWord() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(MockBackend::new(&[("eloquent", "雄弁な")]));
    let mut pipeline = build_pipeline(temp_dir.path(), &input, &output_dir, backend.clone())?;

    let output = pipeline.run().await?;

    assert_eq!(output.output_path, output_dir.join("movie_ruby.ass"));
    let document = read_ass(&output.output_path)?;
    assert!(document.contains(
        "Dialogue: 0,0:00:01.00,0:00:04.00,Main,,0000,0000,0000,,The eloquent speaker impressed everyone."
    ));
    assert!(document.contains("Dialogue: 1,0:00:01.00,0:00:04.00,Ruby,,0000,0000,0000,,雄弁な"));
    assert!(document.contains("Dialogue: 1,0:00:05.00,0:00:09.00,Ruby,,0000,0000,0000,,雄弁な"));
    assert!(document.contains("Dialogue: 0,0:00:10.00,0:00:14.00,Main,,0000,0000,0000,,Thank you."));
    assert_eq!(document.matches("Dialogue:").count(), 5);

    // one request for the one unique difficult lemma
    assert_eq!(backend.requested_words(), vec!["eloquent"]);

    let stats = output.statistics;
    assert_eq!(stats.subtitle_entries, 3);
    assert_eq!(stats.difficult_words, 2);
    assert_eq!(stats.unique_translations, 1);
    assert_eq!(stats.api_translations, 1);
    assert_eq!(stats.cached_translations, 0);
    assert_eq!(stats.failed_translations, 0);
    assert_eq!(stats.annotation_markers, 2);
    assert_eq!(pipeline.statistics(), Some(&stats));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withSecondRun_shouldServeTranslationsFromCache() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");

    let first_backend = Arc::new(MockBackend::new(&[("eloquent", "雄弁な")]));
    build_pipeline(temp_dir.path(), &input, &output_dir, first_backend)?.run().await?;

    let second_backend = Arc::new(MockBackend::new(&[]));
    let output = build_pipeline(temp_dir.path(), &input, &output_dir, second_backend.clone())?
        .run()
        .await?;

    assert_eq!(second_backend.call_count(), 0);
    assert_eq!(output.statistics.cached_translations, 1);
    assert_eq!(output.statistics.api_translations, 0);
    assert!(read_ass(&output.output_path)?.contains(",Ruby,,0000,0000,0000,,雄弁な"));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withFailedTranslation_shouldStillWriteOutput() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let backend = Arc::new(MockBackend::new(&[]));
    backend.fail_word("eloquent", ProviderError::QuotaExceeded("quota".to_string()));
    let mut pipeline = build_pipeline(temp_dir.path(), &input, temp_dir.path(), backend)?;

    let output = pipeline.run().await?;

    let document = read_ass(&output.output_path)?;
    assert!(!document.contains(",Ruby,,"));
    assert_eq!(document.matches("Dialogue:").count(), 3);
    assert_eq!(output.statistics.failed_translations, 1);
    assert_eq!(output.statistics.annotation_markers, 0);
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withProgressCallback_shouldReportStagesInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let backend = Arc::new(MockBackend::new(&[]));
    let events: Arc<Mutex<Vec<PipelineProgress>>> = Arc::new(Mutex::new(Vec::new()));

    let recorder = events.clone();
    let mut pipeline = build_pipeline(temp_dir.path(), &input, temp_dir.path(), backend)?
        .with_progress_callback(Box::new(move |progress| recorder.lock().unwrap().push(progress)));
    pipeline.run().await?;

    let events = events.lock().unwrap();
    let mut stages: Vec<PipelineStage> = events.iter().map(|p| p.stage).collect();
    stages.dedup();
    assert_eq!(stages, PipelineStage::ALL.to_vec());

    // translation sub-progress for the single word
    let translate_events: Vec<&PipelineProgress> = events
        .iter()
        .filter(|p| p.stage == PipelineStage::Translate)
        .collect();
    assert_eq!(translate_events.len(), 2);
    assert!(translate_events[1].message.contains("eloquent (1/1)"));
    assert!(events.iter().all(|p| p.total == 7));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withoutApiKey_shouldFailBeforeAnySideEffect() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("never");
    let mut config = common::test_config(temp_dir.path())?;
    config.translation.api_key = String::new();
    let pipeline_config = PipelineConfig::from_config(&config, &input, &output_dir);
    let backend = Arc::new(MockBackend::new(&[]));
    let called = Arc::new(Mutex::new(false));

    let flag = called.clone();
    let mut pipeline = RubyPipeline::with_components(
        pipeline_config,
        Arc::new(RuleTokenizer::new()),
        common::load_test_lexicon(temp_dir.path())?,
        Arc::new(common::create_service(backend.clone(), temp_dir.path())?),
    )
    .with_progress_callback(Box::new(move |_| *flag.lock().unwrap() = true));

    let error = pipeline.run().await.unwrap_err();

    assert_eq!(error.downcast_ref::<ConfigError>(), Some(&ConfigError::MissingApiKey));
    assert!(!*called.lock().unwrap());
    assert!(!output_dir.exists());
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withVanishedInput_shouldFailValidation() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let mut pipeline = build_pipeline(temp_dir.path(), &input, temp_dir.path(), Arc::new(MockBackend::new(&[])))?;
    std::fs::remove_file(&input)?;

    let error = pipeline.run().await.unwrap_err();

    // validation catches the missing file before the loader runs
    assert!(matches!(error.downcast_ref::<ConfigError>(), Some(ConfigError::InputNotFound(_))));
    assert!(error.downcast_ref::<SubtitleError>().is_none());
    Ok(())
}

#[tokio::test]
async fn test_pipeline_withProperNounExclusion_shouldSkipNames() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "names.srt",
        "1\n00:00:01,000 --> 00:00:02,000\nWe visited Zanzibar and Quixotic harbors.\n",
    )?;
    let mut config = common::test_config(temp_dir.path())?;
    // no tag filter, so only the proper-noun switch keeps names out
    config.pos_filter.include_nouns = false;
    config.pos_filter.include_verbs = false;
    config.pos_filter.exclude_proper_nouns = true;
    let pipeline_config = PipelineConfig::from_config(&config, &input, temp_dir.path());
    let backend = Arc::new(MockBackend::new(&[]));

    let mut pipeline = RubyPipeline::with_components(
        pipeline_config,
        Arc::new(RuleTokenizer::new()),
        common::load_test_lexicon(temp_dir.path())?,
        Arc::new(common::create_service(backend.clone(), temp_dir.path())?),
    );
    pipeline.run().await?;

    let requested = backend.requested_words();
    assert!(!requested.iter().any(|w| w == "zanzibar" || w == "quixotic"));
    assert!(requested.contains(&"harbor".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_run_pipeline_withDefaultComponents_shouldValidateFirst() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = Config::default();

    let result = rubisub::pipeline::run_pipeline(
        &config,
        &temp_dir.path().join("absent.srt"),
        temp_dir.path(),
        None,
    )
    .await;

    let error = result.unwrap_err();
    assert!(matches!(error.downcast_ref::<ConfigError>(), Some(ConfigError::InputNotFound(_))));
    Ok(())
}
