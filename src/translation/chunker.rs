/*!
 * Size-bounded text chunking.
 *
 * Text is cut at the coarsest safe boundary that keeps chunks within the
 * limit: paragraphs first, then sentences, then words. Placeholder tokens
 * contain none of these boundaries and are never split.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// A blank line, possibly containing horizontal whitespace
static PARAGRAPH_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

/// Terminal punctuation or a line break; whitespace after it is optional
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?;]+\s*|\n\s*").unwrap());

static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One bounded slice of the working text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in the document
    pub sequence_index: usize,
    /// Chunk content without trailing whitespace
    pub text: String,
    /// Whitespace that followed the chunk in the source text
    pub trailing: String,
}

impl Chunk {
    /// Length of the chunk content in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Paragraph,
    Sentence,
    Word,
}

impl Granularity {
    fn boundary(self) -> &'static Regex {
        match self {
            Self::Paragraph => &PARAGRAPH_BOUNDARY,
            Self::Sentence => &SENTENCE_BOUNDARY,
            Self::Word => &WORD_BOUNDARY,
        }
    }

    fn finer(self) -> Option<Self> {
        match self {
            Self::Paragraph => Some(Self::Sentence),
            Self::Sentence => Some(Self::Word),
            Self::Word => None,
        }
    }

    /// Cut `text` after every boundary; each unit keeps its trailing whitespace
    fn segment(self, text: &str) -> Vec<&str> {
        let mut units = Vec::new();
        let mut start = 0;

        for boundary in self.boundary().find_iter(text) {
            // Leading whitespace is carried into the next unit
            if text[start..boundary.end()].trim().is_empty() {
                continue;
            }
            units.push(&text[start..boundary.end()]);
            start = boundary.end();
        }

        if start < text.len() {
            units.push(&text[start..]);
        }
        units
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into ordered chunks of at most `max_size` characters
///
/// Units that alone exceed the limit are re-segmented at the next finer
/// granularity; a single word longer than the limit becomes its own chunk.
/// Concatenating `text + trailing` of every chunk reproduces the input.
/// The result always holds at least one chunk; empty input yields one empty chunk.
pub fn split(text: &str, max_size: usize) -> Vec<Chunk> {
    if char_len(text) <= max_size || text.trim().is_empty() {
        let mut builder = ChunkBuilder::new(max_size);
        builder.push(text);
        return builder.finish();
    }

    let mut builder = ChunkBuilder::new(max_size);
    collect_units(text, Granularity::Paragraph, &mut builder);
    builder.finish()
}

fn collect_units(text: &str, granularity: Granularity, builder: &mut ChunkBuilder) {
    for unit in granularity.segment(text) {
        match granularity.finer() {
            Some(finer) if char_len(unit.trim_end()) > builder.max_size => {
                collect_units(unit, finer, builder);
            }
            _ => builder.push(unit),
        }
    }
}

/// Greedy accumulator of units into chunks
struct ChunkBuilder {
    max_size: usize,
    chunks: Vec<Chunk>,
    current: String,
    current_chars: usize,
}

impl ChunkBuilder {
    fn new(max_size: usize) -> Self {
        Self {
            max_size,
            chunks: Vec::new(),
            current: String::new(),
            current_chars: 0,
        }
    }

    fn push(&mut self, unit: &str) {
        if !self.current.is_empty() {
            // Merged chunks stay strictly below the limit
            let candidate = self.current_chars + char_len(unit.trim_end());
            if candidate >= self.max_size {
                self.seal();
            }
        }
        self.current.push_str(unit);
        self.current_chars += char_len(unit);
    }

    fn seal(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let current = std::mem::take(&mut self.current);
        self.current_chars = 0;

        // Whitespace-only text is kept whole as its own chunk
        let content_len = if current.trim().is_empty() {
            current.len()
        } else {
            current.trim_end().len()
        };
        let (text, trailing) = current.split_at(content_len);

        self.chunks.push(Chunk {
            sequence_index: self.chunks.len(),
            text: text.to_string(),
            trailing: trailing.to_string(),
        });
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.seal();
        if self.chunks.is_empty() {
            self.chunks.push(Chunk {
                sequence_index: 0,
                text: String::new(),
                trailing: String::new(),
            });
        }
        self.chunks
    }
}

/// Join translated chunk texts with the original inter-chunk whitespace
pub fn reassemble<'a, I>(chunks: &[Chunk], translated: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut output = String::new();
    for (chunk, text) in chunks.iter().zip(translated) {
        output.push_str(text);
        output.push_str(&chunk.trailing);
    }
    output
}
