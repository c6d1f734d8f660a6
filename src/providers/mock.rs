/*!
 * Mock translation backend for dry runs and testing.
 *
 * This module provides a backend that never touches the network:
 * - `MockProvider::working()` - Always succeeds with tagged text
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::random_latency(min, max)` - Succeeds after a random delay
 * - `.failing_on(marker)` - Fails any request whose text contains `marker`
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ProviderError;
use super::{TranslatedText, Translator};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Succeeds after a fixed delay
    Slow { delay_ms: u64 },
    /// Succeeds after a delay drawn uniformly from `min_ms..=max_ms`
    RandomLatency { min_ms: u64, max_ms: u64 },
}

/// Mock backend; clones share counters and the request log
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Requests fail when their text contains this marker
    fail_marker: Option<String>,
    /// Custom response generator: (text, source, target) -> translation
    custom_response: Option<fn(&str, &str, &str) -> String>,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            fail_marker: None,
            custom_response: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn random_latency(min_ms: u64, max_ms: u64) -> Self {
        Self::new(MockBehavior::RandomLatency { min_ms, max_ms: max_ms.max(min_ms) })
    }

    /// Fail every request whose text contains `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str, &str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Texts of all requests, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    fn delay(&self) -> Option<Duration> {
        match self.behavior {
            MockBehavior::Slow { delay_ms } => Some(Duration::from_millis(delay_ms)),
            MockBehavior::RandomLatency { min_ms, max_ms } => {
                let ms = rand::rng().random_range(min_ms..=max_ms);
                Some(Duration::from_millis(ms))
            }
            _ => None,
        }
    }

    fn respond(&self, count: usize, text: &str, source: &str, target: &str) -> Result<String, ProviderError> {
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: format!("Simulated failure for text containing '{}'", marker),
                });
            }
        }

        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    status_code: 503,
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                })
            }
            _ => Ok(match self.custom_response {
                Some(generator) => generator(text, source, target),
                None => format!("[{}] {}", target, text),
            }),
        }
    }
}

#[async_trait]
impl Translator for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslatedText, ProviderError> {
        let start = Instant::now();
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(text.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(count, text, source_language, target_language);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map(|text| TranslatedText {
            text,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
