use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::translation::concurrency::BackendProfile;
use crate::translation::pipeline::PipelineOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Chunking, pacing and lexicon settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Optional debug side files
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: Google Gemini
    Gemini,
    // @provider: Google Cloud Translation v2
    Google,
    // @provider: Amazon Translate
    Aws,
    // @provider: Offline mock, for dry runs
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
            Self::Gemini => "Gemini",
            Self::Google => "Google Translate",
            Self::Aws => "AWS Translate",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::Gemini => "gemini".to_string(),
            Self::Google => "google".to_string(),
            Self::Aws => "aws".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }

    /// Whether the backend refuses requests without an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Gemini | Self::Google)
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            "gemini" => Ok(Self::Gemini),
            "google" => Ok(Self::Google),
            "aws" => Ok(Self::Aws),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Pipeline settings
///
/// `None` for chunk size, concurrency or delay means "use the selected
/// backend's profile".
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Upper bound on chunk size, in characters
    #[serde(default)]
    pub max_chunk_size: Option<usize>,

    /// Maximum in-flight calls per window
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Pause between windows in milliseconds
    #[serde(default)]
    pub inter_batch_delay_ms: Option<u64>,

    /// Minimum length of a lexicon word
    #[serde(default = "default_min_duplicate_word_length")]
    pub min_duplicate_word_length: usize,

    /// Replace markup with placeholders before translating
    #[serde(default = "default_true")]
    pub enable_span_protection: bool,

    /// Translate repeated words once and substitute them afterwards
    #[serde(default)]
    pub enable_deduplication: bool,

    /// Words per lexicon batch
    #[serde(default = "default_lexicon_batch_size")]
    pub lexicon_batch_size: usize,

    /// Pause between lexicon batches in milliseconds
    #[serde(default = "default_lexicon_delay_ms")]
    pub lexicon_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: None,
            concurrency: None,
            inter_batch_delay_ms: None,
            min_duplicate_word_length: default_min_duplicate_word_length(),
            enable_span_protection: true,
            enable_deduplication: false,
            lexicon_batch_size: default_lexicon_batch_size(),
            lexicon_delay_ms: default_lexicon_delay_ms(),
        }
    }
}

/// Paths of the optional JSON side files
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ArtifactsConfig {
    /// Where to write the protected span table
    #[serde(default)]
    pub spans_path: Option<PathBuf>,

    /// Where to write the lexicon
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_min_duplicate_word_length() -> usize {
    4
}

fn default_lexicon_batch_size() -> usize {
    1000
}

fn default_lexicon_delay_ms() -> u64 {
    100
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434",
        TranslationProvider::OpenAI => "https://api.openai.com/v1",
        // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1",
        TranslationProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        TranslationProvider::Google => "https://translation.googleapis.com",
        // Derived from the AWS region when empty
        TranslationProvider::Aws => "",
        TranslationProvider::Mock => "http://localhost",
    }
    .to_string()
}

fn default_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "llama3.2:3b",
        TranslationProvider::OpenAI => "gpt-4o-mini",
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model",
        TranslationProvider::Gemini => "gemini-1.5-flash",
        TranslationProvider::Google | TranslationProvider::Aws | TranslationProvider::Mock => "",
    }
    .to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. Preserve formatting, keep every [CODE_PART_n] marker exactly as it is, and reply with only the translation.".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        let provider = self.translation.provider;
        if provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                provider.display_name()
            ));
        }

        self.pipeline_options().validate()?;
        Ok(())
    }

    /// Resolve the pipeline settings against the active backend's profile
    pub fn pipeline_options(&self) -> PipelineOptions {
        let profile = BackendProfile::for_provider(self.translation.provider);
        let pipeline = &self.pipeline;

        PipelineOptions {
            max_chunk_size: pipeline.max_chunk_size.unwrap_or(profile.max_chunk_size),
            concurrency: pipeline.concurrency.unwrap_or(profile.concurrency),
            inter_batch_delay_ms: pipeline.inter_batch_delay_ms.unwrap_or(profile.inter_batch_delay_ms),
            min_duplicate_word_length: pipeline.min_duplicate_word_length,
            enable_span_protection: pipeline.enable_span_protection,
            enable_deduplication: pipeline.enable_deduplication,
            lexicon_batch_size: pipeline.lexicon_batch_size,
            lexicon_delay_ms: pipeline.lexicon_delay_ms,
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "vi".to_string(),
            translation: TranslationConfig::default(),
            pipeline: PipelineConfig::default(),
            artifacts: ArtifactsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider's entry, created with defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self.available_providers.iter()
            .position(|p| p.provider_type == provider_str);

        match position {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }
        default_model(self.provider)
    }

    /// Get the API key for the active provider
    ///
    /// An empty key in the file falls back to `TEXTWAI_API_KEY`.
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }
        std::env::var("TEXTWAI_API_KEY").unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }
        default_endpoint(self.provider)
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let available_providers = [
            TranslationProvider::Ollama,
            TranslationProvider::OpenAI,
            TranslationProvider::LMStudio,
            TranslationProvider::Gemini,
            TranslationProvider::Google,
            TranslationProvider::Aws,
        ]
        .into_iter()
        .map(ProviderConfig::new)
        .collect();

        Self {
            provider: TranslationProvider::default(),
            available_providers,
            common: TranslationCommonConfig::default(),
        }
    }
}
