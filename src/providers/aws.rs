/*!
 * Amazon Translate backend.
 *
 * Calls the `TranslateText` action of the AWS JSON 1.1 protocol over reqwest
 * and signs every attempt with SigV4. Credentials and region are read from
 * the standard AWS environment variables.
 */

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{ensure_success, normalize_endpoint, RetryPolicy, TranslatedText, Translator};
use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;

const SERVICE_NAME: &str = "translate";
const TARGET: &str = "AWSShineFrontendService_20170701.TranslateText";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const DEFAULT_REGION: &str = "us-east-1";

/// `TranslateText` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateTextRequest<'a> {
    text: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
}

/// `TranslateText` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateTextResponse {
    translated_text: String,
    #[serde(default)]
    target_language_code: Option<String>,
}

/// Credentials and region resolved from the environment
#[derive(Debug, Clone)]
pub struct AwsEnvironment {
    pub credentials: Credentials,
    pub region: String,
}

impl AwsEnvironment {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`
    /// and `AWS_REGION` (or `AWS_DEFAULT_REGION`) from the process environment
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let (access_key_id, secret_access_key) =
            match (non_empty("AWS_ACCESS_KEY_ID"), non_empty("AWS_SECRET_ACCESS_KEY")) {
                (Some(id), Some(secret)) => (id, secret),
                _ => {
                    return Err(ProviderError::AuthenticationError(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set".to_string(),
                    ))
                }
            };
        let region = non_empty("AWS_REGION")
            .or_else(|| non_empty("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            credentials: Credentials::new(
                access_key_id,
                secret_access_key,
                non_empty("AWS_SESSION_TOKEN"),
                None,
                "environment",
            ),
            region,
        })
    }

    /// Regional service endpoint
    pub fn default_endpoint(&self) -> String {
        format!("https://translate.{}.amazonaws.com", self.region)
    }
}

/// Amazon Translate client
#[derive(Debug)]
pub struct AwsTranslate {
    client: Client,
    environment: AwsEnvironment,
    endpoint: String,
    retry: RetryPolicy,
}

impl AwsTranslate {
    /// Create a client for the given environment
    ///
    /// An empty `endpoint` selects the regional endpoint.
    pub fn new(environment: AwsEnvironment, endpoint: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self, ProviderError> {
        let endpoint = if endpoint.trim().is_empty() {
            environment.default_endpoint()
        } else {
            normalize_endpoint(endpoint)?
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, environment, endpoint, retry })
    }

    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(
            AwsEnvironment::from_env()?,
            &config.get_endpoint(),
            config.get_timeout_secs(),
            RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms),
        )
    }

    pub fn region(&self) -> &str {
        &self.environment.region
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// SigV4 headers for one request body, signed at `time`
    fn signed_headers(&self, body: &[u8], time: SystemTime) -> Result<Vec<(String, String)>, ProviderError> {
        let identity = self.environment.credentials.clone().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.environment.region)
            .name(SERVICE_NAME)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(signing_error)?
            .into();

        let headers = [("content-type", CONTENT_TYPE), ("x-amz-target", TARGET)];
        let signable = SignableRequest::new(
            "POST",
            self.endpoint.as_str(),
            headers.into_iter(),
            SignableBody::Bytes(body),
        )
        .map_err(signing_error)?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(signing_error)?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    async fn send(&self, request: &TranslateTextRequest<'_>) -> Result<TranslateTextResponse, ProviderError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to encode request: {}", e)))?;

        let mut builder = self.client
            .post(&self.endpoint)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", TARGET);
        for (name, value) in self.signed_headers(&body, SystemTime::now())? {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await?;
        let response = ensure_success("aws", response).await?;

        response.json::<TranslateTextResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse AWS response: {}", e)))
    }
}

fn signing_error<E: std::fmt::Display>(error: E) -> ProviderError {
    ProviderError::RequestFailed(format!("Failed to sign AWS request: {}", error))
}

#[async_trait]
impl Translator for AwsTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError> {
        let request = TranslateTextRequest {
            text,
            source_language_code: source_language,
            target_language_code: target_language,
        };

        let start = Instant::now();
        let response = self.retry.run("aws", || self.send(&request)).await?;
        debug!("AWS translated {} chars into {:?}", text.len(), response.target_language_code);

        Ok(TranslatedText {
            text: response.translated_text,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "aws"
    }
}
