/*!
 * Protected span extraction and restoration.
 *
 * Markup that must survive translation untouched is swapped for positional
 * `[CODE_PART_n]` tokens before chunking and swapped back afterwards:
 * - `SpanExtractor::extract` replaces every protected match with its token
 * - `SpanExtractor::restore` puts the original content back, highest index first
 *
 * Restoration fails open: a token the backend dropped is logged and counted.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Placeholder prefix; the full token is `[CODE_PART_<index>]`
pub const PLACEHOLDER_PREFIX: &str = "CODE_PART_";

/// Protected substrings, in priority order
///
/// Declarations and comments come first so a `>` inside a comment does not end
/// the match early. An unterminated tag is only protected on the last line.
/// Literal placeholder text is protected too so tokens never collide.
static PROTECTED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)<!DOCTYPE[^>]*>",
        r"|<!--.*?-->",
        r"|<[^>]+>",
        r"|<[a-z/!][^<>\n]*\z",
        r"|\[CODE_PART_\d+\]",
    ))
    .unwrap()
});

/// A substring replaced by a placeholder token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedSpan {
    /// Dense zero-based index, in order of discovery
    pub index: usize,
    /// The original text, verbatim
    pub content: String,
    /// Character offset of the span in the original document
    pub original_position: usize,
    /// Length of the span in characters
    pub length: usize,
}

impl ProtectedSpan {
    /// The token that stands in for this span
    pub fn placeholder(&self) -> String {
        placeholder(self.index)
    }
}

/// Build the token for span `index`
pub fn placeholder(index: usize) -> String {
    format!("[{}{}]", PLACEHOLDER_PREFIX, index)
}

/// Whether `word` is the word part of a placeholder token (`CODE_PART_3`)
pub fn is_placeholder_word(word: &str) -> bool {
    word.strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Result of putting protected spans back into a translated text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Restoration {
    /// Text with every found token replaced by its span
    pub text: String,
    /// Indices of spans whose token was not found, ascending
    pub missing: Vec<usize>,
    /// Byte ranges of restored span content in `text`, ascending
    pub protected_ranges: Vec<Range<usize>>,
}

/// Extracts and restores protected spans
pub struct SpanExtractor;

impl SpanExtractor {
    /// Replace every protected span in `text` with its placeholder token
    ///
    /// Returns the working text and the span table in left-to-right order.
    pub fn extract(text: &str) -> (String, Vec<ProtectedSpan>) {
        let mut working = String::with_capacity(text.len());
        let mut spans = Vec::new();
        let mut last_end = 0;
        let mut char_position = 0;

        for found in PROTECTED_PATTERN.find_iter(text) {
            let gap = &text[last_end..found.start()];
            working.push_str(gap);
            char_position += gap.chars().count();

            let index = spans.len();
            let length = found.as_str().chars().count();
            working.push_str(&placeholder(index));
            spans.push(ProtectedSpan {
                index,
                content: found.as_str().to_string(),
                original_position: char_position,
                length,
            });

            char_position += length;
            last_end = found.end();
        }
        working.push_str(&text[last_end..]);

        debug!("Extracted {} protected spans", spans.len());
        (working, spans)
    }

    /// Put the spans back into `translated`, highest index first
    ///
    /// Every occurrence of a token is restored. Restored content is never
    /// rescanned, so span content that looks like a token stays as it is.
    pub fn restore(translated: &str, spans: &[ProtectedSpan]) -> Restoration {
        // (start, end, span) of each token occurrence in `translated`
        let mut replacements: Vec<(usize, usize, &ProtectedSpan)> = Vec::new();
        let mut missing = Vec::new();

        for span in spans.iter().rev() {
            let token = span.placeholder();
            let before = replacements.len();
            replacements.extend(
                translated.match_indices(token.as_str())
                    .map(|(start, matched)| (start, start + matched.len(), span)),
            );

            if replacements.len() == before {
                warn!("Placeholder {} missing from translated text, span skipped", token);
                missing.push(span.index);
            }
        }

        // Tokens start with '[' and end with the first ']', so occurrences never overlap
        replacements.sort_unstable_by_key(|(start, _, _)| *start);

        let mut text = String::with_capacity(translated.len());
        let mut protected_ranges = Vec::with_capacity(replacements.len());
        let mut last_end = 0;

        for (start, end, span) in replacements {
            text.push_str(&translated[last_end..start]);
            let content_start = text.len();
            text.push_str(&span.content);
            protected_ranges.push(content_start..text.len());
            last_end = end;
        }
        text.push_str(&translated[last_end..]);

        missing.sort_unstable();
        Restoration { text, missing, protected_ranges }
    }
}
