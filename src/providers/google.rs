use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use super::{ensure_success, normalize_endpoint, RetryPolicy, TranslatedText, Translator};

/// Client for the Google Cloud Translation v2 REST API
#[derive(Debug)]
pub struct GoogleTranslate {
    client: Client,
    api_key: String,
    /// Base URL, e.g. `https://translation.googleapis.com`
    endpoint: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    pub data: TranslateData,
}

#[derive(Debug, Deserialize)]
pub struct TranslateData {
    pub translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
}

impl GoogleTranslate {
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.get_timeout_secs()))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.get_api_key(),
            endpoint: normalize_endpoint(&config.get_endpoint())?,
            retry: RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms),
        })
    }

    async fn send(&self, request: &TranslateRequest<'_>) -> Result<TranslateResponse, ProviderError> {
        let url = format!("{}/language/translate/v2", self.endpoint);
        let response = self.client.post(&url)
            .query(&[("key", &self.api_key)])
            .json(request)
            .send()
            .await?;

        let response = ensure_success("google", response).await?;
        response.json::<TranslateResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Translator for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError> {
        let start = Instant::now();
        // "text" keeps the API from HTML-escaping the placeholders' brackets
        let request = TranslateRequest {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
        };

        let response = self.retry.run("google", || self.send(&request)).await?;
        let translated = response.data.translations.into_iter().next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::ParseError("Google Translate returned no translations".to_string()))?;

        Ok(TranslatedText {
            text: translated,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "google"
    }
}
