use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use super::{ensure_success, normalize_endpoint, render_system_prompt, RetryPolicy, TranslatedText, Translator};

/// Client for OpenAI-compatible chat completion APIs (OpenAI, LM Studio)
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
    /// System prompt template
    system_prompt: String,
    /// Sampling temperature
    temperature: f32,
    /// Retry behaviour for transient failures
    retry: RetryPolicy,
    /// Backend identifier for logs
    name: &'static str,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,
    /// The conversation
    messages: Vec<OpenAIMessage>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// One chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl OpenAI {
    /// Create a client from the translation configuration
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let name = match config.provider {
            TranslationProvider::LMStudio => "lmstudio",
            _ => "openai",
        };

        // LM Studio does not check the key but the header must be present
        let api_key = match (config.get_api_key(), &config.provider) {
            (key, TranslationProvider::LMStudio) if key.is_empty() => "lm-studio".to_string(),
            (key, _) => key,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.get_timeout_secs()))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: normalize_endpoint(&config.get_endpoint())?,
            model: config.get_model(),
            system_prompt: config.common.system_prompt.clone(),
            temperature: config.common.temperature,
            retry: RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms),
            name,
        })
    }

    /// Send one chat completion request
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let response = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let response = ensure_success(self.name, response).await?;
        response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    /// Extract the first choice's text
    pub fn extract_text(response: &OpenAIResponse) -> Option<String> {
        response.choices.first().map(|choice| choice.message.content.trim().to_string())
    }
}

#[async_trait]
impl Translator for OpenAI {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError> {
        let start = Instant::now();
        let request = OpenAIRequest::new(&self.model)
            .add_message("system", render_system_prompt(&self.system_prompt, source_language, target_language))
            .add_message("user", text)
            .temperature(self.temperature);

        let response = self.retry.run(self.name, || self.complete(&request)).await?;
        let translated = Self::extract_text(&response)
            .ok_or_else(|| ProviderError::ParseError(format!("{} returned no choices", self.name)))?;

        Ok(TranslatedText {
            text: translated,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        self.name
    }
}
