/*!
 * Error types for the rubisub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the translation backend.
///
/// These are recoverable: a failed word is recorded in its
/// `TranslationResult` and the batch carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No credential configured, no request was sent
    #[error("API key is not configured")]
    MissingApiKey,

    /// The backend rejected the credential (401/403)
    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    /// Too many requests (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Translation quota exhausted (456)
    #[error("Translation quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other non-2xx response
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason
        message: String,
    },

    /// Transport-level failure (DNS, connect, timeout)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The response body could not be understood
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Short machine-friendly tag used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::RateLimited(_) => "rate_limited",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::ApiError { .. } => "api_error",
            Self::ConnectionError(_) => "connection_error",
            Self::ParseError(_) => "parse_error",
        }
    }

    /// Whether an outbound request was actually made before the failure
    pub fn reached_backend(&self) -> bool {
        !matches!(self, Self::MissingApiKey)
    }
}

/// Errors that can occur while loading subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The input path does not exist
    #[error("Subtitle file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read subtitle file {}: {message}", .path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying reason
        message: String,
    },
}

/// Configuration problems detected before the pipeline starts
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No input subtitle path given
    #[error("Input subtitle file is not specified")]
    MissingInput,

    /// Input subtitle path does not exist
    #[error("Input subtitle file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No output directory given
    #[error("Output directory is not specified")]
    MissingOutputDir,

    /// No translation credential given
    #[error("Translation API key is not configured")]
    MissingApiKey,

    /// Language code not recognised
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    /// Endpoint override is not a valid URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Threshold out of range
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the translation backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle loading
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    /// Recover the typed cause, looking through any added context
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<ConfigError>() {
            Ok(e) => return Self::Config(e),
            Err(error) => error,
        };
        let error = match error.downcast::<SubtitleError>() {
            Ok(e) => return Self::Subtitle(e),
            Err(error) => error,
        };
        let error = match error.downcast::<ProviderError>() {
            Ok(e) => return Self::Provider(e),
            Err(error) => error,
        };
        match error.downcast::<std::io::Error>() {
            Ok(e) => e.into(),
            Err(error) => Self::Unknown(format!("{:#}", error)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
