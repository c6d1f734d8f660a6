/*!
 * Translation backends behind a single port.
 *
 * Every backend implements [`Translator`], so the pipeline never knows which
 * service it is talking to:
 * - `openai`: OpenAI chat completions (also used for LM Studio)
 * - `gemini`: Google Gemini `generateContent`
 * - `google`: Google Cloud Translation v2
 * - `aws`: Amazon Translate, SigV4-signed
 * - `ollama`: Local Ollama server
 * - `mock`: Offline backend for dry runs and tests
 */

use async_trait::async_trait;
use log::error;
use reqwest::Response;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils;

pub mod aws;
pub mod gemini;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;

/// Text returned by a backend together with the time the call took
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedText {
    /// The translated text
    pub text: String,
    /// Wall-clock latency of the call in milliseconds
    pub latency_ms: u64,
}

/// The translation port consumed by the lexicon builder and the batch scheduler
///
/// One call translates one string. Implementations may retry internally, but
/// the pipeline itself makes exactly one call per chunk or word.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `source_language` to `target_language`
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError>;

    /// Short backend identifier used in logs
    fn name(&self) -> &str;
}

/// Build the backend selected by the configuration
pub fn from_config(config: &TranslationConfig) -> Result<Arc<dyn Translator>, ProviderError> {
    let translator: Arc<dyn Translator> = match config.provider {
        TranslationProvider::OpenAI | TranslationProvider::LMStudio => {
            Arc::new(openai::OpenAI::from_config(config)?)
        }
        TranslationProvider::Gemini => Arc::new(gemini::Gemini::from_config(config)?),
        TranslationProvider::Google => Arc::new(google::GoogleTranslate::from_config(config)?),
        TranslationProvider::Aws => Arc::new(aws::AwsTranslate::from_config(config)?),
        TranslationProvider::Ollama => Arc::new(ollama::Ollama::from_config(config)?),
        TranslationProvider::Mock => Arc::new(mock::MockProvider::working()),
    };
    Ok(translator)
}

/// Exponential backoff for transient backend failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, backend: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    error!("{} request failed: {} - attempt {}/{}",
                           backend, e, attempt, self.max_retries + 1);
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Normalize an endpoint into a base URL without a trailing slash
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ProviderError::RequestFailed("Endpoint cannot be empty".to_string()));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("http://{}", endpoint))
    }
    .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    if url.host_str().is_none() {
        return Err(ProviderError::RequestFailed(format!("Invalid host in endpoint: {}", endpoint)));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Turn a non-success response into a `ProviderError`
pub(crate) async fn ensure_success(backend: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    error!("{} API error ({}): {}", backend, status, error_text);
    Err(ProviderError::from_status(status.as_u16(), error_text))
}

/// Fill the `{source_language}` / `{target_language}` placeholders of a prompt
pub fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    let display = |code: &str| {
        language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
    };
    template
        .replace("{source_language}", &display(source_language))
        .replace("{target_language}", &display(target_language))
}
