/*!
 * Chunked long-text translation.
 *
 * This module contains the translation core. It is split into several
 * submodules:
 *
 * - `spans`: Protected span extraction and restoration
 * - `chunker`: Size-bounded splitting at paragraph, sentence and word boundaries
 * - `lexicon`: Duplicate-word lexicon building and application
 * - `scheduler`: Bounded-window concurrent translation calls
 * - `metrics`: Run counters and the summary report
 * - `concurrency`: Per-backend pacing defaults
 * - `pipeline`: The stage orchestrator tying everything together
 */

// Re-export main types for easier usage
pub use self::chunker::Chunk;
pub use self::concurrency::BackendProfile;
pub use self::lexicon::{Lexicon, LexiconBuilder};
pub use self::metrics::RunMetrics;
pub use self::pipeline::{PipelineOptions, PipelineOutput, PipelineStage, TranslationPipeline};
pub use self::scheduler::{BatchScheduler, Cancellation, ProgressCallback, TranslationResult, UnitKind};
pub use self::spans::{ProtectedSpan, Restoration, SpanExtractor};

// Submodules
pub mod chunker;
pub mod concurrency;
pub mod lexicon;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod spans;
