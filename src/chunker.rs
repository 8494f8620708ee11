// file: src/chunker.rs
// description: overlapping fixed-size text windows with safe UTF-8 handling
// reference: sliding window chunking for bounded-context model calls

use crate::config::ChunkingConfig;
use crate::error::{PipelineError, Result};

/// One window of the input text. Offsets are byte positions into the original
/// string, snapped outwards to char boundaries so multi-byte characters are
/// never split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Lazy left-to-right chunk iterator. Consecutive chunks overlap by the
/// configured amount; the stride is `size - overlap` and must be positive or
/// iteration would never advance.
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.size == 0 {
            return Err(PipelineError::Config(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if config.overlap >= config.size {
            return Err(PipelineError::Config(format!(
                "chunk overlap ({}) must be less than chunk size ({})",
                config.overlap, config.size
            )));
        }

        Ok(Self {
            size: config.size,
            overlap: config.overlap,
        })
    }

    pub fn stride(&self) -> usize {
        self.size - self.overlap
    }

    pub fn chunks<'a>(&self, text: &'a str) -> ChunkIter<'a> {
        ChunkIter {
            text,
            size: self.size,
            stride: self.stride(),
            position: 0,
            index: 0,
        }
    }
}

pub struct ChunkIter<'a> {
    text: &'a str,
    size: usize,
    stride: usize,
    position: usize,
    index: usize,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.position >= self.text.len() {
            return None;
        }

        let start = boundary_before(self.text, self.position);
        let end = boundary_after(self.text, (self.position + self.size).min(self.text.len()));

        let chunk = Chunk {
            index: self.index,
            start,
            end,
            text: &self.text[start..end],
        };

        self.position += self.stride;
        self.index += 1;

        Some(chunk)
    }
}

fn boundary_before(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn boundary_after(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}
