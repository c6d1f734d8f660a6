/*!
 * Duplicate-word lexicon.
 *
 * Words that occur more than once are translated a single time each and
 * substituted into the translated text afterwards. Substitution is
 * whole-word and case-sensitive, done in one tokenizing pass so a
 * replacement is never matched again.
 */

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::ops::Range;
use std::time::Duration;

use crate::errors::PipelineError;
use super::metrics::RunMetrics;
use super::scheduler::{BatchScheduler, UnitKind};
use super::spans::is_placeholder_word;

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Distinct words occurring more than once with at least `min_length` characters
///
/// Returned in the order in which each word was first seen a second time.
/// Placeholder tokens are never lexicon words.
pub fn find_duplicate_words(text: &str, min_length: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for word in WORD_PATTERN.find_iter(text).map(|m| m.as_str()) {
        let count = counts.entry(word).or_insert(0);
        *count += 1;
        if *count == 2 && word.chars().count() >= min_length && !is_placeholder_word(word) {
            duplicates.push(word.to_string());
        }
    }
    duplicates
}

/// Length figures for replacing each duplicate with a short `#n` marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationStats {
    pub original_length: usize,
    pub reduced_length: usize,
}

impl OptimizationStats {
    pub fn characters_reduced(&self) -> usize {
        self.original_length.saturating_sub(self.reduced_length)
    }

    pub fn percentage_reduced(&self) -> f64 {
        if self.original_length == 0 {
            return 0.0;
        }
        self.characters_reduced() as f64 * 100.0 / self.original_length as f64
    }
}

/// How much shorter `text` gets when every duplicate is replaced by its marker
pub fn optimization_stats(text: &str, duplicates: &[String]) -> OptimizationStats {
    let markers: HashMap<&str, usize> = duplicates.iter()
        .enumerate()
        .map(|(index, word)| (word.as_str(), format!("#{}", index).len()))
        .collect();

    let original_length = text.chars().count();
    let saved: usize = WORD_PATTERN.find_iter(text)
        .filter_map(|m| {
            markers.get(m.as_str())
                .map(|marker_len| m.as_str().chars().count().saturating_sub(*marker_len))
        })
        .sum();

    OptimizationStats {
        original_length,
        reduced_length: original_length - saved,
    }
}

/// Insertion-ordered source word -> translated word mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry; a replaced entry keeps its position
    pub fn insert(&mut self, source: impl Into<String>, translated: impl Into<String>) {
        let source = source.into();
        let translated = translated.into();
        match self.index.get(&source) {
            Some(&position) => self.entries[position].1 = translated,
            None => {
                self.index.insert(source.clone(), self.entries.len());
                self.entries.push((source, translated));
            }
        }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.index.get(source).map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Substitute every whole-word occurrence of each entry
    ///
    /// Bytes inside `protected` ranges (restored spans, ascending and
    /// non-overlapping) are copied through unchanged.
    pub fn apply(&self, text: &str, protected: &[Range<usize>]) -> String {
        if self.is_empty() {
            return text.to_string();
        }

        let mut output = String::with_capacity(text.len());
        let mut last_end = 0;
        let mut protected = protected.iter().peekable();

        for word in WORD_PATTERN.find_iter(text) {
            while protected.peek().is_some_and(|range| range.end <= word.start()) {
                protected.next();
            }
            if protected.peek().is_some_and(|range| range.start < word.end()) {
                continue;
            }

            if let Some(translated) = self.get(word.as_str()) {
                output.push_str(&text[last_end..word.start()]);
                output.push_str(translated);
                last_end = word.end();
            }
        }
        output.push_str(&text[last_end..]);
        output
    }
}

impl Serialize for Lexicon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, translated) in &self.entries {
            map.serialize_entry(source, translated)?;
        }
        map.end()
    }
}

/// Translates duplicate words in paced batches through the scheduler
pub struct LexiconBuilder {
    scheduler: BatchScheduler,
    batch_size: usize,
    batch_delay: Duration,
}

impl LexiconBuilder {
    /// `batch_size` words per batch, `batch_delay_ms` between batches
    pub fn new(scheduler: BatchScheduler, batch_size: usize, batch_delay_ms: u64) -> Self {
        Self {
            scheduler,
            batch_size: batch_size.max(1),
            batch_delay: Duration::from_millis(batch_delay_ms),
        }
    }

    /// Translate each word once; a failed or empty translation maps the word to itself
    pub async fn build(&self, words: &[String], metrics: &mut RunMetrics) -> Result<Lexicon, PipelineError> {
        let mut lexicon = Lexicon::new();
        let batch_count = words.len().div_ceil(self.batch_size);

        for (batch_index, batch) in words.chunks(self.batch_size).enumerate() {
            debug!("Translating lexicon batch {}/{} ({} words)", batch_index + 1, batch_count, batch.len());
            let results = self.scheduler.translate_all(batch, UnitKind::Word, metrics).await?;

            for (word, result) in batch.iter().zip(results) {
                let translated = result.text.trim();
                if result.failed || translated.is_empty() {
                    lexicon.insert(word.as_str(), word.as_str());
                } else {
                    lexicon.insert(word.as_str(), translated);
                }
            }

            if batch_index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!("Lexicon built: {} words ({} kept untranslated)", lexicon.len(), metrics.failed_words);
        Ok(lexicon)
    }
}
