use async_trait::async_trait;
use log::trace;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::language_utils;

use super::{base_url, http_client, Translator};

/// Path of the public web translation endpoint
const TRANSLATE_PATH: &str = "translate_a/single";

/// Client for the public Google web translation endpoint
///
/// The endpoint auto-detects the source language when `sl=auto` and answers
/// with a nested JSON array whose first element lists translated segments.
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client, reused for every chunk of a document
    client: Client,
    /// Full URL of the translate endpoint
    url: Url,
}

impl GoogleTranslate {
    /// Create a new client for the given endpoint base
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base = base_url(endpoint)?;
        let url = Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), TRANSLATE_PATH))
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client: http_client(timeout)?,
            url,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(&config.get_endpoint(), config.get_timeout())
    }

    /// The endpoint wants short codes (`en`, `hi`) or `auto`
    fn language_param(code: &str) -> String {
        if language_utils::is_auto_detect(code) {
            return language_utils::AUTO_DETECT.to_string();
        }
        language_utils::normalize_to_part1_or_part2t(code)
            .unwrap_or_else(|_| code.trim().to_lowercase())
    }

    /// Concatenate the translated segments of a response body
    pub fn extract_translation(body: &Value) -> Result<String, ProviderError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("response has no segment list".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        Ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let sl = Self::language_param(source_language);
        let tl = Self::language_param(target_language);

        let response = self
            .client
            .post(self.url.clone())
            .query(&[("client", "gtx"), ("sl", sl.as_str()), ("tl", tl.as_str()), ("dt", "t")])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(ProviderError::from_reqwest)?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        trace!("Google response: {} bytes", body.len());
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Self::extract_translation(&value)
    }

    fn name(&self) -> &str {
        "google"
    }
}
