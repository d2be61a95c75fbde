#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Represents a chunk of a source document ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The chunk text, words joined by single spaces
    pub content: String,
    /// The index of this chunk within its source document
    pub chunk_index: usize,
    /// Offset of the first word of this chunk within the source document
    pub word_offset: usize,
}

/// Configuration for word-window chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words
    pub chunk_size: usize,
    /// Number of words shared by consecutive windows
    pub overlap: usize,
    /// Chunks whose trimmed length is at or below this many characters are not indexed
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            min_chunk_chars: 50,
        }
    }
}

impl ChunkingConfig {
    /// Distance in words between the starts of consecutive windows, never below 1
    #[inline]
    pub fn step(&self) -> usize {
        step_size(self.chunk_size, self.overlap)
    }

    /// Whether a chunk carries enough text to be worth indexing
    #[inline]
    pub fn is_indexable(&self, chunk: &str) -> bool {
        chunk.trim().chars().count() > self.min_chunk_chars
    }
}

fn step_size(chunk_size: usize, overlap: usize) -> usize {
    chunk_size.max(1).saturating_sub(overlap).max(1)
}

/// Split text into overlapping windows of `chunk_size` words.
///
/// Windows start every `chunk_size - overlap` words. Once a window reaches the
/// last word no further windows are produced, so text of at most `chunk_size`
/// words yields exactly one chunk. Text without any words comes back unchanged
/// as a single element.
#[inline]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    word_windows(text, chunk_size, overlap)
        .into_iter()
        .map(|(_, chunk)| chunk)
        .collect()
}

/// Chunk a document using the configured window and record each chunk's position
#[inline]
pub fn chunk_content(text: &str, config: &ChunkingConfig) -> Vec<ContentChunk> {
    let chunks: Vec<ContentChunk> = word_windows(text, config.chunk_size, config.overlap)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, (word_offset, content))| ContentChunk {
            content,
            chunk_index,
            word_offset,
        })
        .collect();

    debug!(
        "Chunked {} bytes into {} chunks (size {}, overlap {})",
        text.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    chunks
}

fn word_windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, String)> {
    let words = text.split_whitespace().collect::<Vec<_>>();
    if words.is_empty() {
        return vec![(0, text.to_string())];
    }

    let size = chunk_size.max(1);
    let step = step_size(chunk_size, overlap);
    let mut windows = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + size).min(words.len());
        windows.push((start, words[start..end].join(" ")));
        if end == words.len() {
            break;
        }
        start += step;
    }

    windows
}
