use serde::Serialize;
use std::fmt::Write;

use super::scheduler::{TranslationResult, UnitKind};
use super::spans::ProtectedSpan;

/// Aggregate counters for one pipeline run
///
/// Updated by the scheduler once per completed window and by the pipeline
/// between stages, never from inside a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Characters of the working text sent for translation
    pub total_original_chars: usize,
    /// Characters returned for the chunks, fallbacks included
    pub total_translated_chars: usize,
    /// Wall-clock duration of the whole run
    pub total_duration_ms: u64,
    /// Duration of the chunk translation stage, pacing delays included
    pub translation_stage_ms: u64,
    /// Sum of per-call backend latencies, chunks and words
    pub api_time_ms: u64,
    /// Sum of per-call backend latencies for chunks only
    pub chunk_api_time_ms: u64,
    pub chunk_count: usize,
    pub failed_chunks: usize,
    pub word_count: usize,
    pub failed_words: usize,
    /// Windows issued, chunk and lexicon windows together
    pub window_count: usize,
    pub protected_span_count: usize,
    /// Characters moved out of the text by span extraction
    pub protected_chars: usize,
    /// Characters of the placeholder tokens that replaced them
    pub placeholder_chars: usize,
    /// Placeholders not found during restoration
    pub missing_placeholders: usize,
}

impl RunMetrics {
    /// Account for one completed window of results
    pub fn record_window(&mut self, kind: UnitKind, results: &[TranslationResult]) {
        self.window_count += 1;
        for result in results {
            self.api_time_ms += result.duration_ms;
            match kind {
                UnitKind::Chunk => {
                    self.chunk_count += 1;
                    self.chunk_api_time_ms += result.duration_ms;
                    self.total_original_chars += result.original_length;
                    self.total_translated_chars += result.translated_length;
                    if result.failed {
                        self.failed_chunks += 1;
                    }
                }
                UnitKind::Word => {
                    self.word_count += 1;
                    if result.failed {
                        self.failed_words += 1;
                    }
                }
            }
        }
    }

    /// Account for the span table produced by extraction
    pub fn record_spans(&mut self, spans: &[ProtectedSpan]) {
        self.protected_span_count = spans.len();
        self.protected_chars = spans.iter().map(|s| s.length).sum();
        self.placeholder_chars = spans.iter().map(|s| s.placeholder().chars().count()).sum();
    }

    /// Characters saved by span extraction (negative when tokens are longer)
    pub fn characters_reduced(&self) -> i64 {
        self.protected_chars as i64 - self.placeholder_chars as i64
    }

    /// Translated/original character ratio
    pub fn character_ratio(&self) -> f64 {
        if self.total_original_chars == 0 {
            return 0.0;
        }
        self.total_translated_chars as f64 / self.total_original_chars as f64
    }

    /// Original chunk characters translated per second of chunk backend time
    pub fn chars_per_second(&self) -> f64 {
        if self.chunk_api_time_ms == 0 {
            return 0.0;
        }
        self.total_original_chars as f64 / (self.chunk_api_time_ms as f64 / 1000.0)
    }

    /// Human-readable report of the run
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Translation Summary ===");
        let _ = writeln!(out, "Total time: {}", format_duration(self.total_duration_ms));
        let _ = writeln!(out, "Total translation time (including delays): {}", format_duration(self.translation_stage_ms));
        let _ = writeln!(out, "Pure API call time: {}", format_duration(self.api_time_ms));
        let _ = writeln!(out, "Chunks: {} ({} failed)", self.chunk_count, self.failed_chunks);
        if self.word_count > 0 {
            let _ = writeln!(out, "Lexicon words: {} ({} failed)", self.word_count, self.failed_words);
        }
        let _ = writeln!(out, "Original characters: {}", self.total_original_chars);
        let _ = writeln!(out, "Translated characters: {}", self.total_translated_chars);
        if self.protected_span_count > 0 {
            let _ = writeln!(out, "Protected spans: {} ({} characters extracted)", self.protected_span_count, self.protected_chars);
            let _ = writeln!(out, "Characters reduced during processing: {}", self.characters_reduced());
        }
        if self.missing_placeholders > 0 {
            let _ = writeln!(out, "Missing placeholders: {}", self.missing_placeholders);
        }
        let _ = writeln!(out, "Character ratio: {:.2}x", self.character_ratio());
        let _ = write!(out, "Average translation speed: {:.0} chars/second", self.chars_per_second());
        out
    }
}

/// Format milliseconds as `1m 5s 20ms`, dropping leading zero units
pub fn format_duration(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    if minutes > 0 {
        format!("{}m {}s {}ms", minutes, seconds, millis)
    } else if seconds > 0 {
        format!("{}s {}ms", seconds, millis)
    } else {
        format!("{}ms", millis)
    }
}
