/*!
 * Tests for inline annotation markers
 */

use rubisub::annotation::{self, AnnotationTag};
use rubisub::difficulty::{CoreVocabLevel, DifficultyEvaluator, Lexicon, ProficiencyLevel};
use rubisub::errors::ProviderError;
use rubisub::nlp::{self, RuleTokenizer};
use rubisub::translation::{TranslationMap, TranslationResult};

/// Helper building a tag for the first occurrence of `word` in `line`
fn tag_for(line: &str, word: &str, translation: &str) -> AnnotationTag {
    let start = line.find(word).unwrap();
    AnnotationTag::new(word, translation, start, start + word.len())
}

fn translated(word: &str, translation: &str) -> TranslationResult {
    TranslationResult {
        source: word.to_string(),
        translation: translation.to_string(),
        cached: false,
        error: None,
    }
}

#[test]
fn test_splice_withSingleTag_shouldInsertMarker() {
    let line = "The eloquent speaker impressed everyone.";

    let result = annotation::splice(line, &[tag_for(line, "eloquent", "雄弁な")]);

    assert_eq!(result, "The r{eloquent|雄弁な} speaker impressed everyone.");
}

#[test]
fn test_splice_withNoTags_shouldReturnLineUnchanged() {
    let line = "Nothing to see here.";
    assert_eq!(annotation::splice(line, &[]), line);
}

#[test]
fn test_splice_withAnyTagOrder_shouldProduceSameText() {
    let line = "The eloquent speaker impressed everyone.";
    let tags = vec![
        tag_for(line, "eloquent", "雄弁な"),
        tag_for(line, "speaker", "話し手"),
        tag_for(line, "impressed", "感動させた"),
    ];
    let expected = "The r{eloquent|雄弁な} r{speaker|話し手} r{impressed|感動させた} everyone.";

    let orders: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let shuffled: Vec<AnnotationTag> = order.iter().map(|&i| tags[i].clone()).collect();
        assert_eq!(annotation::splice(line, &shuffled), expected, "order {:?}", order);
    }
}

#[test]
fn test_strip_markers_afterSplice_shouldRestoreOriginal() {
    let lines = [
        "The eloquent speaker impressed everyone.",
        "Ça va, naïve friend? Déjà vu!",
        "Line one\nline two with a lantern",
    ];

    for line in lines {
        let tags: Vec<AnnotationTag> = RuleTokenizer::new()
            .tokenize_line(line)
            .into_iter()
            .filter(|t| t.is_alpha && t.text.chars().count() > 3)
            .map(|t| AnnotationTag::new(t.text.clone(), format!("<{}>", t.text.len()), t.start, t.end))
            .collect();

        let annotated = annotation::splice(line, &tags);

        assert_eq!(annotation::strip_markers(&annotated), line);
        assert_eq!(annotation::count_markers(&annotated), tags.len());
    }
}

#[test]
fn test_strip_markers_withLiteralMarkerPrefixInLine_shouldRestoreOriginal() {
    let line = "Per{cent eloquent";
    let tags = vec![tag_for(line, "eloquent", "雄弁な")];

    let annotated = annotation::splice(line, &tags);

    assert_eq!(annotated, "Per{cent r{eloquent|雄弁な}");
    assert_eq!(annotation::strip_markers(&annotated), line);
    assert_eq!(annotation::translation_only(&annotated), "Per{cent 雄弁な");
    assert_eq!(annotation::extract_translations(&annotated), vec!["雄弁な"]);
    assert_eq!(annotation::count_markers(&annotated), 1);
}

#[test]
fn test_splice_tags_withDuplicateSpan_shouldApplyOnce() {
    let line = "harbor lights";
    let tag = tag_for(line, "harbor", "港");

    let result = annotation::splice_tags(line, &[tag.clone(), tag]);

    assert_eq!(result.text, "r{harbor|港} lights");
    assert_eq!(result.applied.len(), 1);
}

#[test]
fn test_splice_tags_withStaleSpan_shouldSkipTag() {
    let line = "harbor lights";
    let stale = AnnotationTag::new("lights", "光", 0, 6);

    let result = annotation::splice_tags(line, &[stale]);

    assert_eq!(result.text, line);
    assert!(result.applied.is_empty());
}

#[test]
fn test_splice_tags_withBraceInOriginal_shouldSkipTag() {
    let line = "a {weird} word";
    let tags = vec![tag_for(line, "{weird}", "変"), tag_for(line, "word", "語")];

    let result = annotation::splice_tags(line, &tags);

    assert_eq!(result.text, "a {weird} r{word|語}");
}

#[test]
fn test_splice_tags_withEmptyTranslation_shouldSkipTag() {
    let line = "harbor lights";
    let result = annotation::splice_tags(line, &[tag_for(line, "harbor", "  ")]);
    assert_eq!(result.text, line);
}

#[test]
fn test_extract_translations_withSeveralMarkers_shouldKeepOrder() {
    let text = "r{harbor|港} and r{lantern|ランタン}\nr{verdict|評決}";

    assert_eq!(annotation::extract_translations(text), vec!["港", "ランタン", "評決"]);
    assert_eq!(annotation::translation_only(text), "港 and ランタン\n評決");
    assert!(annotation::has_markers(text));
    assert!(!annotation::has_markers("plain {text} | here"));
}

#[test]
fn test_to_marker_withTag_shouldUseMarkerSyntax() {
    let tag = AnnotationTag::new("word", "語", 0, 4);
    assert_eq!(tag.to_marker(), "r{word|語}");
}

#[test]
fn test_annotate_line_withFlaggedTokens_shouldAnnotateEveryOccurrence() {
    let line = "Eloquent words, eloquent speaker.";
    let tokens = nlp::clean_tokens(RuleTokenizer::new().tokenize_line(line));
    let mut lexicon = Lexicon::default();
    for word in ["word", "speaker"] {
        lexicon.core_vocab.insert(word.to_string(), CoreVocabLevel::Level1);
        lexicon.proficiency.insert(word.to_string(), ProficiencyLevel::A1);
        lexicon.frequency.insert(word.to_string(), 10);
    }
    let evaluator = DifficultyEvaluator::new(lexicon);
    let difficulties = evaluator.evaluate_all(&tokens);
    let mut translations = TranslationMap::new();
    translations.insert("eloquent", translated("eloquent", "雄弁な"));

    let result = annotation::annotate_line(line, &tokens, &difficulties, &translations);

    assert_eq!(result.text, "r{Eloquent|雄弁な} words, r{eloquent|雄弁な} speaker.");
    assert_eq!(result.applied.len(), 2);
}

#[test]
fn test_annotate_line_withFailedTranslation_shouldLeaveWordUntouched() {
    let line = "The verdict arrived.";
    let tokens = nlp::clean_tokens(RuleTokenizer::new().tokenize_line(line));
    let evaluator = DifficultyEvaluator::new(Lexicon::default());
    let difficulties = evaluator.evaluate_all(&tokens);
    let mut translations = TranslationMap::new();
    translations.insert(
        "verdict",
        TranslationResult {
            source: "verdict".to_string(),
            translation: String::new(),
            cached: false,
            error: Some(ProviderError::QuotaExceeded("limit".to_string())),
        },
    );
    // the rule lemmatizer leaves "arriv", so the surface form is looked up
    translations.insert("arrived", translated("arrived", "到着した"));

    let result = annotation::annotate_line(line, &tokens, &difficulties, &translations);

    assert_eq!(result.text, "The verdict r{arrived|到着した}.");
}

#[test]
fn test_parse_markers_withMarkedText_shouldReturnTags() {
    let text = "The r{eloquent|雄弁な} speaker";

    let tags = annotation::parse_markers(text);

    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].original, "eloquent");
    assert_eq!(tags[0].translation, "雄弁な");
    assert_eq!(&text[tags[0].start..tags[0].end], "r{eloquent|雄弁な}");
}
