/*!
 * End-to-end translation pipeline.
 *
 * Stages run strictly in order:
 * `Idle -> SpansExtracted -> (LexiconBuilt) -> Chunked -> Translated ->
 * Reassembled -> SpansRestored -> (LexiconApplied) -> Done`.
 * The lexicon stages only run when deduplication is enabled. A fatal error
 * aborts the run and leaves the stage at the last one reached.
 */

use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

use crate::errors::PipelineError;
use crate::providers::Translator;
use super::chunker;
use super::lexicon::{find_duplicate_words, optimization_stats, Lexicon, LexiconBuilder};
use super::metrics::RunMetrics;
use super::scheduler::{BatchScheduler, Cancellation, ProgressCallback, UnitKind};
use super::spans::{ProtectedSpan, SpanExtractor};

/// Resolved pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOptions {
    /// Upper bound on chunk size, in characters
    pub max_chunk_size: usize,
    /// Calls in flight per window
    pub concurrency: usize,
    /// Pause between windows in milliseconds
    pub inter_batch_delay_ms: u64,
    pub min_duplicate_word_length: usize,
    pub enable_span_protection: bool,
    pub enable_deduplication: bool,
    /// Words per lexicon batch
    pub lexicon_batch_size: usize,
    /// Pause between lexicon batches in milliseconds
    pub lexicon_delay_ms: u64,
    pub source_language: String,
    pub target_language: String,
}

impl PipelineOptions {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |message: &str| Err(PipelineError::Configuration(message.to_string()));

        if self.max_chunk_size == 0 {
            return invalid("max_chunk_size must be greater than 0");
        }
        if self.concurrency == 0 {
            return invalid("concurrency must be greater than 0");
        }
        if self.min_duplicate_word_length == 0 {
            return invalid("min_duplicate_word_length must be greater than 0");
        }
        if self.lexicon_batch_size == 0 {
            return invalid("lexicon_batch_size must be greater than 0");
        }
        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return invalid("source and target languages must be set");
        }
        Ok(())
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 5000,
            concurrency: 10,
            inter_batch_delay_ms: 100,
            min_duplicate_word_length: 4,
            enable_span_protection: true,
            enable_deduplication: false,
            lexicon_batch_size: 1000,
            lexicon_delay_ms: 100,
            source_language: "en".to_string(),
            target_language: "vi".to_string(),
        }
    }
}

/// Position of a run in the stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    SpansExtracted,
    LexiconBuilt,
    Chunked,
    Translated,
    Reassembled,
    SpansRestored,
    LexiconApplied,
    Done,
}

/// Everything a finished run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final translated text
    pub text: String,
    pub metrics: RunMetrics,
    /// Span table, empty when protection is disabled
    pub spans: Vec<ProtectedSpan>,
    /// Lexicon, present when deduplication ran
    pub lexicon: Option<Lexicon>,
}

/// Orchestrates one document through all stages
pub struct TranslationPipeline {
    translator: Arc<dyn Translator>,
    options: PipelineOptions,
    cancellation: Cancellation,
    progress: Option<ProgressCallback>,
    stage: PipelineStage,
}

impl TranslationPipeline {
    /// Create a pipeline; fails fast on invalid options
    pub fn new(translator: Arc<dyn Translator>, options: PipelineOptions) -> Result<Self, PipelineError> {
        options.validate()?;
        Ok(Self {
            translator,
            options,
            cancellation: Cancellation::new(),
            progress: None,
            stage: PipelineStage::Idle,
        })
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Report chunk translation progress as `(completed_windows, total_windows)`
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!("Pipeline stage: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn scheduler(&self) -> Result<BatchScheduler, PipelineError> {
        Ok(BatchScheduler::new(
            self.translator.clone(),
            self.options.source_language.clone(),
            self.options.target_language.clone(),
            self.options.concurrency,
            self.options.inter_batch_delay_ms,
        )?
        .with_cancellation(self.cancellation.clone()))
    }

    /// Translate `input` and return the final text with metrics
    pub async fn run(&mut self, input: &str) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        self.stage = PipelineStage::Idle;

        if input.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let mut metrics = RunMetrics::default();

        let (working, spans) = if self.options.enable_span_protection {
            SpanExtractor::extract(input)
        } else {
            (input.to_string(), Vec::new())
        };
        metrics.record_spans(&spans);
        if !spans.is_empty() {
            info!("Protected {} spans ({} characters, {} after placeholders)",
                  spans.len(), metrics.protected_chars, metrics.placeholder_chars);
        }
        self.advance(PipelineStage::SpansExtracted);

        let lexicon = if self.options.enable_deduplication {
            let words = find_duplicate_words(&working, self.options.min_duplicate_word_length);
            let stats = optimization_stats(&working, &words);
            info!("Found {} duplicate words; replacing them would save {} characters ({:.2}%)",
                  words.len(), stats.characters_reduced(), stats.percentage_reduced());

            let builder = LexiconBuilder::new(
                self.scheduler()?,
                self.options.lexicon_batch_size,
                self.options.lexicon_delay_ms,
            );
            let lexicon = builder.build(&words, &mut metrics).await?;
            self.advance(PipelineStage::LexiconBuilt);
            Some(lexicon)
        } else {
            None
        };

        let chunks = chunker::split(&working, self.options.max_chunk_size);
        info!("Split {} characters into {} chunks (max {} per chunk)",
              working.chars().count(), chunks.len(), self.options.max_chunk_size);
        self.advance(PipelineStage::Chunked);

        let translation_started = Instant::now();
        let mut scheduler = self.scheduler()?;
        if let Some(progress) = &self.progress {
            scheduler = scheduler.with_progress(progress.clone());
        }
        let results = scheduler.translate_all(&chunks, UnitKind::Chunk, &mut metrics).await?;
        metrics.translation_stage_ms = translation_started.elapsed().as_millis() as u64;
        self.advance(PipelineStage::Translated);

        let reassembled = chunker::reassemble(&chunks, results.iter().map(|r| r.text.as_str()));
        self.advance(PipelineStage::Reassembled);

        let (mut text, protected_ranges) = if self.options.enable_span_protection {
            let restoration = SpanExtractor::restore(&reassembled, &spans);
            metrics.missing_placeholders = restoration.missing.len();
            (restoration.text, restoration.protected_ranges)
        } else {
            (reassembled, Vec::new())
        };
        self.advance(PipelineStage::SpansRestored);

        if let Some(lexicon) = &lexicon {
            text = lexicon.apply(&text, &protected_ranges);
            self.advance(PipelineStage::LexiconApplied);
        }

        metrics.total_duration_ms = started.elapsed().as_millis() as u64;
        self.advance(PipelineStage::Done);

        Ok(PipelineOutput {
            text,
            metrics,
            spans,
            lexicon,
        })
    }
}
