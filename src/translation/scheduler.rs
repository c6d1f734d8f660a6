/*!
 * Bounded-window batch translation.
 *
 * Items are translated in consecutive windows of `concurrency` calls. A window
 * is awaited as a whole before the next one starts, with a pause between
 * windows and none after the last. Every call owns one slot of a pre-sized
 * result array, so output order never depends on completion order.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::errors::PipelineError;
use crate::providers::Translator;
use super::metrics::RunMetrics;

/// Progress callback: `(completed_windows, total_windows)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// What the scheduled items are, for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Chunk,
    Word,
}

/// Outcome of one translation call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Position of the item in the scheduled sequence
    pub sequence_index: usize,
    /// Translated text, or the source text when `failed`
    pub text: String,
    pub duration_ms: u64,
    /// Source length in characters
    pub original_length: usize,
    /// Result length in characters
    pub translated_length: usize,
    /// The call failed and `text` is the untranslated source
    pub failed: bool,
}

impl TranslationResult {
    fn fallback(sequence_index: usize, source: &str, duration_ms: u64) -> Self {
        let length = source.chars().count();
        Self {
            sequence_index,
            text: source.to_string(),
            duration_ms,
            original_length: length,
            translated_length: length,
            failed: true,
        }
    }
}

/// Cooperative cancellation shared between the caller and a running pipeline
///
/// Checked before each window is issued and raced against the pacing delay.
/// A window already in flight always runs to completion.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender is owned by `self`, so this only happens during teardown
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs translation calls in bounded, paced windows
#[derive(Clone)]
pub struct BatchScheduler {
    translator: Arc<dyn Translator>,
    source_language: String,
    target_language: String,
    concurrency: usize,
    inter_batch_delay: Duration,
    cancellation: Cancellation,
    progress: Option<ProgressCallback>,
}

impl BatchScheduler {
    /// Create a scheduler; `concurrency` must be at least 1
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        concurrency: usize,
        inter_batch_delay_ms: u64,
    ) -> Result<Self, PipelineError> {
        if concurrency == 0 {
            return Err(PipelineError::Configuration("concurrency must be at least 1".to_string()));
        }

        Ok(Self {
            translator,
            source_language: source_language.into(),
            target_language: target_language.into(),
            concurrency,
            inter_batch_delay: Duration::from_millis(inter_batch_delay_ms),
            cancellation: Cancellation::new(),
            progress: None,
        })
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of windows needed for `items` items
    pub fn window_count(&self, items: usize) -> usize {
        items.div_ceil(self.concurrency)
    }

    /// Translate every item, returning results in item order
    ///
    /// A failed call yields a fallback result carrying the source text. The
    /// only error is cancellation, observed between windows.
    pub async fn translate_all<T>(
        &self,
        items: &[T],
        kind: UnitKind,
        metrics: &mut RunMetrics,
    ) -> Result<Vec<TranslationResult>, PipelineError>
    where
        T: AsRef<str> + Sync,
    {
        let total_windows = self.window_count(items.len());
        let mut slots: Vec<Option<TranslationResult>> = vec![None; items.len()];

        for (window_index, window) in items.chunks(self.concurrency).enumerate() {
            if self.cancellation.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    completed_windows: window_index,
                    total_windows,
                });
            }

            let offset = window_index * self.concurrency;
            let window_results: Vec<TranslationResult> = stream::iter(window.iter().enumerate())
                .map(|(position, item)| self.translate_one(offset + position, item.as_ref()))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            metrics.record_window(kind, &window_results);
            let failed = window_results.iter().filter(|r| r.failed).count();
            debug!("{:?} window {}/{} done: {} calls, {} failed",
                   kind, window_index + 1, total_windows, window_results.len(), failed);

            for result in window_results {
                let slot = result.sequence_index;
                slots[slot] = Some(result);
            }

            if let Some(progress) = &self.progress {
                progress(window_index + 1, total_windows);
            }

            if window_index + 1 < total_windows && !self.inter_batch_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.inter_batch_delay) => {}
                    _ = self.cancellation.cancelled() => {
                        return Err(PipelineError::Cancelled {
                            completed_windows: window_index + 1,
                            total_windows,
                        });
                    }
                }
            }
        }

        Ok(slots.into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| TranslationResult::fallback(index, items[index].as_ref(), 0))
            })
            .collect())
    }

    async fn translate_one(&self, sequence_index: usize, text: &str) -> TranslationResult {
        let start = Instant::now();
        match self.translator.translate(text, &self.source_language, &self.target_language).await {
            Ok(translated) => TranslationResult {
                sequence_index,
                original_length: text.chars().count(),
                translated_length: translated.text.chars().count(),
                text: translated.text,
                duration_ms: translated.latency_ms,
                failed: false,
            },
            Err(e) => {
                warn!("{} failed on item {}, keeping source text: {}",
                      self.translator.name(), sequence_index, e);
                TranslationResult::fallback(sequence_index, text, start.elapsed().as_millis() as u64)
            }
        }
    }
}
