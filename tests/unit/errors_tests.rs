/*!
 * Tests for error types
 */

use std::path::PathBuf;
use rubisub::errors::{AppError, ConfigError, ProviderError, SubtitleError};

#[test]
fn test_provider_error_kind_withEachVariant_shouldBeDistinct() {
    let errors = vec![
        ProviderError::MissingApiKey,
        ProviderError::Unauthenticated("x".to_string()),
        ProviderError::RateLimited("x".to_string()),
        ProviderError::QuotaExceeded("x".to_string()),
        ProviderError::ApiError { status_code: 500, message: "x".to_string() },
        ProviderError::ConnectionError("x".to_string()),
        ProviderError::ParseError("x".to_string()),
    ];

    let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
    kinds.sort_unstable();
    kinds.dedup();
    assert_eq!(kinds.len(), errors.len());
}

#[test]
fn test_provider_error_reached_backend_withMissingKey_shouldBeFalse() {
    assert!(!ProviderError::MissingApiKey.reached_backend());
    assert!(ProviderError::RateLimited("x".to_string()).reached_backend());
}

#[test]
fn test_provider_error_display_withApiError_shouldIncludeStatus() {
    let error = ProviderError::ApiError { status_code: 503, message: "unavailable".to_string() };
    assert_eq!(error.to_string(), "API responded with error: 503 - unavailable");
}

#[test]
fn test_subtitle_error_display_withPath_shouldMentionIt() {
    let error = SubtitleError::NotFound(PathBuf::from("/tmp/missing.srt"));
    assert!(error.to_string().contains("/tmp/missing.srt"));
}

#[test]
fn test_app_error_from_withConfigError_shouldWrap() {
    let error: AppError = ConfigError::MissingApiKey.into();
    assert!(matches!(error, AppError::Config(ConfigError::MissingApiKey)));
    assert!(error.to_string().starts_with("Configuration error"));
}

#[test]
fn test_app_error_from_withIoError_shouldConvert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: AppError = io.into();
    assert!(error.to_string().contains("gone"));
}

#[test]
fn test_app_error_from_withContextWrappedConfigError_shouldRecoverType() {
    let error = anyhow::Error::from(ConfigError::MissingApiKey).context("Failed to start pipeline");

    let error: AppError = error.into();

    assert!(matches!(error, AppError::Config(ConfigError::MissingApiKey)));
}

#[test]
fn test_app_error_from_withAnyhowSubtitleError_shouldRecoverType() {
    let error = anyhow::Error::from(SubtitleError::NotFound(PathBuf::from("a.srt")));

    let error: AppError = error.into();

    assert!(matches!(error, AppError::Subtitle(SubtitleError::NotFound(_))));
}

#[test]
fn test_app_error_from_withUntypedAnyhowError_shouldKeepFullChain() {
    let error = anyhow::anyhow!("disk full").context("Failed to write output");

    let error: AppError = error.into();

    match error {
        AppError::Unknown(message) => assert_eq!(message, "Failed to write output: disk full"),
        other => panic!("expected Unknown, got {:?}", other),
    }
}
