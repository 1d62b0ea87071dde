use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::TranslationBackend;
use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;

/// DeepL client for the `/v2/translate` endpoint
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// Authentication key, sent as `DeepL-Auth-Key <key>`
    api_key: String,
    /// Full URL of the translate endpoint
    endpoint: String,
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One entry per submitted text
    #[serde(default)]
    pub translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Language DeepL detected for the input
    #[serde(default)]
    pub detected_source_language: Option<String>,

    /// Translated text
    pub text: String,
}

impl fmt::Debug for DeepL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepL")
            .field("endpoint", &self.endpoint)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl DeepL {
    /// Create a new DeepL client; every request is bounded by `timeout`
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the DeepL HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from the translation settings
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.get_endpoint(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Map a non-success status to the failure classification
    pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("no response body").to_string()
        } else {
            body.trim().to_string()
        };

        match status.as_u16() {
            401 | 403 => ProviderError::Unauthenticated(format!("Invalid API key: {}", message)),
            429 => ProviderError::RateLimited(message),
            456 => ProviderError::QuotaExceeded(message),
            code => ProviderError::ApiError {
                status_code: code,
                message,
            },
        }
    }

    /// Extract the first translation of a response body
    pub fn extract_text(response: &DeepLResponse) -> String {
        response
            .translations
            .first()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TranslationBackend for DeepL {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let params = [
            ("text", text),
            ("source_lang", source_language),
            ("target_lang", target_language),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Self::classify_status(status, &body);
            error!("DeepL API error ({}): {}", status, err);
            return Err(err);
        }

        let parsed = response
            .json::<DeepLResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let translation = Self::extract_text(&parsed);
        debug!("DeepL translated '{}' -> '{}'", text, translation);
        Ok(translation)
    }

    fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn name(&self) -> &str {
        "deepl"
    }
}
