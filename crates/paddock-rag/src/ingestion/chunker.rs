//! Overlapping text chunking with boundary preference
//!
//! Chunks are contiguous substrings of the input measured in characters.
//! Every chunk after the first starts with the last `overlap` characters of
//! its predecessor, so dropping those characters and concatenating the
//! chunks reproduces the input exactly.
//!
//! Within each window of `chunk_size` characters the cut is placed at the
//! last paragraph break, else the last sentence boundary, else the last
//! whitespace, else at the window edge. Breaks that would leave a chunk
//! shorter than half the window (or not longer than the overlap) are ignored
//! so chunks stay useful for retrieval and the iterator always advances.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk size must be > 0"));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from the chunking section of the config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily split `text` into chunks
    ///
    /// Empty text yields nothing; any other text yields at least one chunk.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            pos: 0,
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            min_chars: (self.overlap + 1).max(self.chunk_size / 2),
            done: text.is_empty(),
        }
    }
}

/// Iterator over the chunks of a text, see [`TextChunker::split`]
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset where the next chunk starts
    pos: usize,
    chunk_size: usize,
    overlap: usize,
    /// Shortest chunk a soft break may produce
    min_chars: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.pos..];
        let window_end = char_offset(rest, self.chunk_size);
        if window_end == rest.len() {
            self.done = true;
            return Some(rest);
        }

        let window = &rest[..window_end];
        let min_break = char_offset(window, self.min_chars);
        let cut = find_break(window, min_break).unwrap_or(window_end);
        let chunk = &rest[..cut];

        self.pos += tail_start(chunk, self.overlap);
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Byte offset of the `n`th character, or `s.len()` when shorter
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Byte offset where the last `n` characters of `s` begin
fn tail_start(s: &str, n: usize) -> usize {
    if n == 0 {
        return s.len();
    }
    s.char_indices().rev().nth(n - 1).map(|(i, _)| i).unwrap_or(0)
}

/// Best cut position in `window` at or after `min_break`
fn find_break(window: &str, min_break: usize) -> Option<usize> {
    let tail = &window[min_break..];

    if let Some(pos) = tail.rfind("\n\n") {
        return Some(min_break + pos + 2);
    }

    if let Some(start) = window
        .split_sentence_bound_indices()
        .map(|(i, _)| i)
        .filter(|&i| i >= min_break && i > 0)
        .last()
    {
        return Some(start);
    }

    tail.char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| min_break + i + c.len_utf8())
}
