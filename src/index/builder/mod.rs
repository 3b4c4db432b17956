
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::index::{ChunkMetadata, EmbeddingRecord, IndexManifest, VectorStore};
use crate::loader::{FileOutcome, load_directory};
use crate::{RagError, Result, chunking};

/// Summary of a completed index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub document_count: usize,
    pub chunk_count: usize,
    /// Per-file load outcomes, including skipped files and why
    pub outcomes: Vec<FileOutcome>,
}

/// Rebuilds the persisted vector index from the full document corpus.
///
/// Every build is a full rebuild: load all PDFs, chunk, embed, write the
/// records into a fresh dataset in a staging directory, then swap it into
/// place. A failed build deletes its staging directory and leaves the
/// previously persisted index untouched, so concurrent readers of the old
/// artifact are never affected. Two builds racing resolve to whichever
/// swap lands last ("last successful build wins").
pub struct IndexBuilder<'a> {
    config: &'a Config,
    embedder: &'a dyn Embedder,
}

impl<'a> IndexBuilder<'a> {
    #[inline]
    pub fn new(config: &'a Config, embedder: &'a dyn Embedder) -> Self {
        Self { config, embedder }
    }

    /// Run a full build and atomically replace the persisted index.
    #[inline]
    pub async fn build(&self) -> Result<BuildReport> {
        let documents_dir = self.config.documents_dir();
        info!("Building index from {}", documents_dir.display());

        let (documents, outcomes) = load_directory(&documents_dir)?;
        if documents.is_empty() {
            return Err(RagError::NoContent);
        }

        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(chunking::chunk_document(
                &document.filename,
                &document.combined_text(),
                &self.config.chunking,
            ));
        }

        if chunks.is_empty() {
            return Err(RagError::NoContent);
        }

        info!(
            "Embedding {} chunks from {} documents",
            chunks.len(),
            documents.len()
        );

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        if vectors.len() != chunks.len() {
            return Err(RagError::EmbeddingUnavailable(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    source_file: chunk.source_file.clone(),
                    chunk_index: chunk.chunk_index as u32,
                    content: chunk.content.clone(),
                    created_at: created_at.clone(),
                },
            })
            .collect();

        let manifest = IndexManifest {
            model: self.embedder.model_id(),
            dimension: self.embedder.dimension() as u32,
            chunk_count: records.len() as u64,
            document_count: documents.len() as u64,
            built_at: created_at,
        };

        let report = BuildReport {
            document_count: documents.len(),
            chunk_count: records.len(),
            outcomes,
        };

        self.persist(records, &manifest).await?;

        info!(
            "Index build complete: {} chunks from {} documents",
            report.chunk_count, report.document_count
        );

        Ok(report)
    }

    /// Write records to a staging dataset, then swap it into place.
    async fn persist(
        &self,
        records: Vec<EmbeddingRecord>,
        manifest: &IndexManifest,
    ) -> Result<()> {
        let index_dir = self.config.index_dir();
        let parent = index_dir
            .parent()
            .ok_or_else(|| RagError::Index("Index directory has no parent".to_string()))?
            .to_path_buf();
        fs::create_dir_all(&parent)?;

        let staging = parent.join(format!(".index-build-{}", Uuid::new_v4()));

        let write_result = Self::write_dataset(&staging, self.embedder.dimension(), records).await;
        if let Err(e) = write_result {
            Self::remove_dir_best_effort(&staging);
            return Err(e);
        }

        if let Err(e) = manifest.save(&staging) {
            Self::remove_dir_best_effort(&staging);
            return Err(e);
        }

        Self::swap_into_place(&staging, &index_dir, &parent)
    }

    async fn write_dataset(
        staging: &Path,
        dimension: usize,
        records: Vec<EmbeddingRecord>,
    ) -> Result<()> {
        let store = VectorStore::create(staging, dimension).await?;
        store.store_embeddings_batch(records).await
    }

    /// Replace the current index directory with the staging directory.
    ///
    /// The current dataset is renamed aside before the staging dataset is
    /// renamed into place, so a reader never observes a half-written
    /// directory at the index path. If the second rename fails, the
    /// retired dataset is restored.
    fn swap_into_place(staging: &Path, index_dir: &Path, parent: &Path) -> Result<()> {
        let retired = parent.join(format!(".index-retired-{}", Uuid::new_v4()));
        let had_previous = index_dir.exists();

        if had_previous {
            fs::rename(index_dir, &retired).map_err(|e| {
                Self::remove_dir_best_effort(staging);
                RagError::Index(format!("Failed to retire previous index: {}", e))
            })?;
        }

        if let Err(e) = fs::rename(staging, index_dir) {
            if had_previous {
                if let Err(restore_err) = fs::rename(&retired, index_dir) {
                    warn!("Failed to restore retired index: {}", restore_err);
                }
            }
            Self::remove_dir_best_effort(staging);
            return Err(RagError::Index(format!(
                "Failed to activate new index: {}",
                e
            )));
        }

        if had_previous {
            Self::remove_dir_best_effort(&retired);
        }

        Ok(())
    }

    fn remove_dir_best_effort(dir: &Path) {
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(dir) {
                warn!("Failed to clean up {}: {}", dir.display(), e);
            }
        }
    }
}
