/*!
 * Translation backend implementations.
 *
 * A backend resolves one word at a time and reports failures as a
 * classified `ProviderError` instead of aborting:
 * - DeepL: the DeepL REST API (free and pro endpoints)
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for translation backends
///
/// Implementations only perform the request; caching and rate limiting
/// happen in `TranslationService`.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate a single word or phrase
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - Backend language directive of the input (e.g. "EN")
    /// * `target_language` - Backend language directive of the output (e.g. "JA")
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Whether a credential is configured; no request is made without one
    fn has_credential(&self) -> bool;

    /// Short name for logs
    fn name(&self) -> &str;
}

pub mod deepl;

pub use deepl::DeepL;
