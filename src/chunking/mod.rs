
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A bounded text segment, the atomic retrieval unit stored in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text content
    pub content: String,
    /// Filename of the source document
    pub source_file: String,
    /// Position of this chunk within its source document
    pub chunk_index: usize,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Characters shared between adjacent chunks of the same document
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 800,
            overlap_size: 100,
        }
    }
}

/// Split one document's text into overlapping fixed-size chunks.
///
/// Deterministic: identical input always yields the identical chunk
/// sequence. Every chunk except the document tail is exactly
/// `max_chunk_size` characters (unless the whole document is shorter), and
/// adjacent chunks share `overlap_size` characters. Overlap never crosses
/// document boundaries because chunking is applied per document.
#[inline]
pub fn chunk_document(source_file: &str, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // Windows are measured in characters, not bytes, so multi-byte text
    // never splits inside a code point.
    let chars: Vec<char> = text.chars().collect();
    let max = config.max_chunk_size.max(1);
    let step = max.saturating_sub(config.overlap_size).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + max).min(chars.len());
        let content: String = chars.get(start..end).unwrap_or_default().iter().collect();
        chunks.push(Chunk {
            content,
            source_file: source_file.to_string(),
            chunk_index: chunks.len(),
        });

        if end == chars.len() {
            break;
        }
        start += step;
    }

    debug!(
        "Chunked '{}' ({} chars) into {} chunks",
        source_file,
        chars.len(),
        chunks.len()
    );

    chunks
}
