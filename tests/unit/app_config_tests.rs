/*!
 * Tests for application configuration functionality
 */

use textwai::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "vi");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.log_level, LogLevel::Info);

    let ollama_config = config.translation.get_provider_config(&TranslationProvider::Ollama)
        .expect("Ollama provider config should exist");
    assert_eq!(ollama_config.endpoint, "http://localhost:11434");
    assert_eq!(ollama_config.timeout_secs, 60);

    assert!(config.pipeline.enable_span_protection);
    assert!(!config.pipeline.enable_deduplication);
    assert_eq!(config.pipeline.min_duplicate_word_length, 4);
    assert!(config.artifacts.spans_path.is_none());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "zz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Invalid target language
    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    // Zero chunk size is rejected
    config.pipeline.max_chunk_size = Some(0);
    assert!(config.validate().is_err());
    config.pipeline.max_chunk_size = None;

    // Zero concurrency is rejected
    config.pipeline.concurrency = Some(0);
    assert!(config.validate().is_err());
    config.pipeline.concurrency = None;

    // Local providers need no key
    config.translation.provider = TranslationProvider::LMStudio;
    assert!(config.validate().is_ok());

    // OpenAI with an explicit key
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().api_key = "sk-1234567890".to_string();
    assert!(config.validate().is_ok());
}

/// Test that a keyless OpenAI setup is rejected unless the environment provides one
#[test]
fn test_config_validation_withMissingApiKey_shouldFail() {
    if std::env::var("TEXTWAI_API_KEY").is_ok() {
        return;
    }
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Gemini;
    config.translation.active_provider_config_mut().api_key = String::new();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("API key"));
}

/// Test that profile defaults apply per backend and overrides win
#[test]
fn test_pipelineOptions_shouldResolveAgainstBackendProfile() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Gemini;

    let options = config.pipeline_options();
    assert_eq!(options.max_chunk_size, 10000);
    assert_eq!(options.concurrency, 1);
    assert_eq!(options.inter_batch_delay_ms, 500);

    config.pipeline.concurrency = Some(3);
    config.pipeline.inter_batch_delay_ms = Some(0);
    let options = config.pipeline_options();
    assert_eq!(options.max_chunk_size, 10000);
    assert_eq!(options.concurrency, 3);
    assert_eq!(options.inter_batch_delay_ms, 0);
    assert_eq!(options.target_language, "vi");
}

/// Test that a partial JSON file fills in defaults
#[test]
fn test_deserialize_withPartialJson_shouldApplyDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_language": "ja",
        "translation": {
            "provider": "openai",
            "available_providers": [
                { "type": "openai", "model": "gpt-4o", "api_key": "sk-test" }
            ]
        },
        "pipeline": { "enable_deduplication": true, "max_chunk_size": 800 }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.get_model(), "gpt-4o");
    assert_eq!(config.translation.get_api_key(), "sk-test");
    assert_eq!(config.translation.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.translation.get_timeout_secs(), 60);
    assert!(config.pipeline.enable_deduplication);
    assert!(config.pipeline.enable_span_protection);
    assert_eq!(config.pipeline_options().max_chunk_size, 800);
    assert_eq!(config.pipeline_options().concurrency, 10);
    assert!(config.validate().is_ok());
}

/// Test that the default configuration survives a JSON round trip
#[test]
fn test_serialize_withDefaultConfig_shouldRoundTrip() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.pipeline, config.pipeline);
    assert_eq!(parsed.translation.provider, config.translation.provider);
    assert_eq!(parsed.translation.available_providers.len(), config.translation.available_providers.len());
}

/// Test provider name parsing and formatting
#[test]
fn test_translationProvider_shouldParseAndDisplay() {
    assert_eq!("OpenAI".parse::<TranslationProvider>().unwrap(), TranslationProvider::OpenAI);
    assert_eq!("lmstudio".parse::<TranslationProvider>().unwrap(), TranslationProvider::LMStudio);
    assert!("anthropic".parse::<TranslationProvider>().is_err());

    assert_eq!(TranslationProvider::Google.to_string(), "google");
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
    assert!(TranslationProvider::Google.requires_api_key());
    assert!(!TranslationProvider::Ollama.requires_api_key());
}

/// Test the provider config constructor
#[test]
fn test_providerConfig_new_shouldUseProviderDefaults() {
    let config = ProviderConfig::new(TranslationProvider::LMStudio);

    assert_eq!(config.provider_type, "lmstudio");
    assert_eq!(config.endpoint, "http://localhost:1234/v1");
    assert!(config.api_key.is_empty());
}

/// Test that the AWS backend is selectable and picks up its own profile
#[test]
fn test_awsProvider_shouldParseAndResolveProfile() {
    let json = r#"{
        "source_language": "en",
        "target_language": "vi",
        "translation": { "provider": "aws" }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::Aws);
    assert_eq!("AWS".parse::<TranslationProvider>().unwrap(), TranslationProvider::Aws);
    assert_eq!(TranslationProvider::Aws.display_name(), "AWS Translate");
    assert!(!TranslationProvider::Aws.requires_api_key());
    assert!(config.translation.get_endpoint().is_empty());

    let options = config.pipeline_options();
    assert_eq!(options.max_chunk_size, 9000);
    assert_eq!(options.concurrency, 10);
    assert_eq!(options.inter_batch_delay_ms, 100);
}
