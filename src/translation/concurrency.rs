/*!
 * Backend-specific pacing defaults.
 *
 * Each backend has its own sweet spot for chunk size, window width and the
 * pause between windows. These values apply whenever the configuration
 * leaves the matching pipeline setting unset.
 */

use crate::app_config::TranslationProvider;

/// Tuned defaults for one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendProfile {
    /// Largest chunk sent in one request, in characters
    pub max_chunk_size: usize,
    /// Calls in flight per window
    pub concurrency: usize,
    /// Pause between windows in milliseconds
    pub inter_batch_delay_ms: u64,
}

impl BackendProfile {
    /// Get the profile for a given backend
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            // Bulk translation API: large requests, wide windows
            TranslationProvider::Google => Self {
                max_chunk_size: 5000,
                concurrency: 10,
                inter_batch_delay_ms: 100,
            },
            // Amazon Translate accepts up to 10,000 bytes per request
            TranslationProvider::Aws => Self {
                max_chunk_size: 9000,
                concurrency: 10,
                inter_batch_delay_ms: 100,
            },
            // Chat models drift on long inputs, so chunks stay small
            TranslationProvider::OpenAI => Self {
                max_chunk_size: 500,
                concurrency: 10,
                inter_batch_delay_ms: 100,
            },
            // Free-tier Gemini is rate limited per minute; one call at a time
            TranslationProvider::Gemini => Self {
                max_chunk_size: 10000,
                concurrency: 1,
                inter_batch_delay_ms: 500,
            },
            // Local servers: no rate limit, bounded by the machine
            TranslationProvider::Ollama => Self {
                max_chunk_size: 2000,
                concurrency: 4,
                inter_batch_delay_ms: 0,
            },
            TranslationProvider::LMStudio => Self {
                max_chunk_size: 500,
                concurrency: 4,
                inter_batch_delay_ms: 0,
            },
            TranslationProvider::Mock => Self {
                max_chunk_size: 5000,
                concurrency: 10,
                inter_batch_delay_ms: 0,
            },
        }
    }
}
