/*!
 * Translation service clients.
 *
 * Every client implements `Translator`, a single text-in/text-out operation
 * taking a source-language hint (possibly `auto`) and a target language:
 * - `google`: public web translation endpoint (default)
 * - `ollama`: local LLM server
 * - `anthropic`: Anthropic Messages API
 * - `mock`: deterministic stub for tests and dry runs
 *
 * Clients are opened per document through a `TranslatorFactory`, so no
 * connection state is shared between documents.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// A service able to translate a piece of text
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `source_language` (ISO code or `auto`) into `target_language`
    ///
    /// Any error is treated as transient by the caller.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// Opens a translator session scoped to one document
pub trait TranslatorFactory: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn Translator>, ProviderError>;
}

impl TranslatorFactory for TranslationConfig {
    fn open_session(&self) -> Result<Box<dyn Translator>, ProviderError> {
        let session: Box<dyn Translator> = match self.provider {
            TranslationProvider::Google => Box::new(google::GoogleTranslate::from_config(self)?),
            TranslationProvider::Ollama => Box::new(ollama::Ollama::from_config(self)?),
            TranslationProvider::Anthropic => Box::new(anthropic::Anthropic::from_config(self)?),
            TranslationProvider::Mock => Box::new(mock::MockProvider::working()),
        };
        Ok(session)
    }
}

/// Normalize the `endpoint` string of a provider config to a base URL without a trailing slash
pub(crate) fn base_url(endpoint: &str) -> Result<url::Url, ProviderError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProviderError::NotConfigured("Endpoint cannot be empty".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    url::Url::parse(&with_scheme)
        .map_err(|e| ProviderError::NotConfigured(format!("Invalid endpoint '{}': {}", endpoint, e)))
}

/// Build the shared reqwest client for a provider
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to build HTTP client: {}", e)))
}

/// Fill the `{source_language}` / `{target_language}` placeholders of an LLM prompt
pub(crate) fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    let target_name = crate::language_utils::get_language_name(target_language)
        .unwrap_or_else(|_| target_language.to_string());
    template
        .replace("{source_language}", &crate::language_utils::describe_source_hint(source_language))
        .replace("{target_language}", &target_name)
}

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod ollama;
