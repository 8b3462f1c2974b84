use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;

use super::{base_url, http_client, render_system_prompt, Translator};

/// Ollama client for translating through a local LLM
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API, without trailing slash
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name
    model: String,
    /// Prompt template with language placeholders
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Always false, one JSON object per request
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system message
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let base = base_url(endpoint)?;
        Ok(Self {
            base_url: base.as_str().trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature,
        })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.get_endpoint(),
            config.get_model(),
            config.common.system_prompt.clone(),
            config.common.temperature,
            config.get_timeout(),
        )
    }

    /// Send one generation request
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama API response: {}", e)))
    }
}

#[async_trait]
impl Translator for Ollama {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(render_system_prompt(&self.system_prompt, source_language, target_language))
            .temperature(self.temperature);

        let response = self.generate(&request).await?;
        if !response.done {
            return Err(ProviderError::ParseError("Ollama returned an unfinished generation".to_string()));
        }

        Ok(response.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
