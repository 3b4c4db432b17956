// Vector index module
// Persists (vector, chunk) records in a LanceDB dataset and rebuilds the
// whole artifact from the document corpus

pub mod builder;
pub mod store;

pub use builder::{BuildReport, IndexBuilder};
pub use store::{SearchResult, VectorStore};

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Embedding record stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this record
    pub id: String,
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata stored alongside each embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Filename of the source PDF
    pub source_file: String,
    /// Position of the chunk within its source document
    pub chunk_index: u32,
    /// The chunk text content
    pub content: String,
    /// Timestamp when this record was created
    pub created_at: String,
}

/// Summary of a persisted index, written beside the dataset on every build.
///
/// The index carries no explicit format version; it is implicitly versioned
/// by the embedding model that produced it, so the manifest records the
/// model id and dimension for the loader to check against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexManifest {
    pub model: String,
    pub dimension: u32,
    pub chunk_count: u64,
    pub document_count: u64,
    pub built_at: String,
}

impl IndexManifest {
    pub const FILE_NAME: &'static str = "manifest.json";

    #[inline]
    pub fn load(index_dir: &Path) -> Result<Self> {
        let path = index_dir.join(Self::FILE_NAME);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read index manifest: {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse index manifest: {}", path.display()))?;
        Ok(manifest)
    }

    #[inline]
    pub fn save(&self, index_dir: &Path) -> Result<()> {
        let path = index_dir.join(Self::FILE_NAME);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize index manifest")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write index manifest: {}", path.display()))?;
        Ok(())
    }
}
