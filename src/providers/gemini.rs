use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use super::{ensure_success, normalize_endpoint, render_system_prompt, RetryPolicy, TranslatedText, Translator};

/// Client for the Gemini `generateContent` API
#[derive(Debug)]
pub struct Gemini {
    client: Client,
    api_key: String,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    endpoint: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

impl GeminiRequest {
    /// Single-turn request with deterministic sampling
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: GenerationConfig {
                temperature,
                top_k: 1,
                top_p: 1.0,
            },
        }
    }
}

impl Gemini {
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.get_timeout_secs()))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.get_api_key(),
            endpoint: normalize_endpoint(&config.get_endpoint())?,
            model: config.get_model(),
            system_prompt: config.common.system_prompt.clone(),
            temperature: config.common.temperature,
            retry: RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms),
        })
    }

    /// Gemini takes no system role here, so instructions and text share one prompt
    pub fn build_prompt(&self, text: &str, source_language: &str, target_language: &str) -> String {
        format!(
            "{}\n\nOriginal text:\n{}\n\nTranslation:",
            render_system_prompt(&self.system_prompt, source_language, target_language),
            text
        )
    }

    async fn generate(&self, request: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self.client.post(&url)
            .query(&[("key", &self.api_key)])
            .json(request)
            .send()
            .await?;

        let response = ensure_success("gemini", response).await?;
        response.json::<GeminiResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let candidate = response.candidates.first()?;
        let text: String = candidate.content.parts.iter().map(|p| p.text.as_str()).collect();
        Some(text.trim().to_string())
    }
}

#[async_trait]
impl Translator for Gemini {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError> {
        let start = Instant::now();
        let request = GeminiRequest::new(
            self.build_prompt(text, source_language, target_language),
            self.temperature,
        );

        let response = self.retry.run("gemini", || self.generate(&request)).await?;
        let translated = Self::extract_text(&response)
            .ok_or_else(|| ProviderError::ParseError("Gemini returned no candidates".to_string()))?;

        Ok(TranslatedText {
            text: translated,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
