
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::answer::{Answer, compose};
use crate::config::Config;
use crate::embeddings::Embedder;
use crate::index::{IndexBuilder, IndexManifest, VectorStore};
use crate::Result;

/// A chunk retrieved for a question, ordered most-similar first.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub content: String,
    pub source_file: String,
    pub similarity: f32,
}

/// Result of retrieval for one question.
///
/// Index unavailability is a first-class state rather than an error: every
/// caller is forced to decide how to render it, and no fault from the
/// index path can escape to the request boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// No valid index is loaded (absent, corrupted, or never built)
    Unavailable,
    /// Top-k retrieved chunks; empty when the index holds no matches
    Results(Vec<RetrievedChunk>),
}

/// Process-wide retrieval context: configuration, the pinned embedder, and
/// the currently open index.
///
/// The open index is held behind `RwLock<Option<Arc<_>>>`; queries clone
/// the `Arc` and run concurrently without coordination, and [`reload`]
/// swaps the reference rather than mutating a dataset in place. Rebuilds
/// performed by [`IndexBuilder`] do not refresh this context by themselves:
/// callers must invoke [`reload`] (or restart the process) after a rebuild
/// to serve the new artifact.
///
/// [`reload`]: KnowledgeBase::reload
pub struct KnowledgeBase {
    config: Config,
    embedder: Arc<dyn Embedder>,
    index: RwLock<Option<Arc<VectorStore>>>,
}

impl KnowledgeBase {
    /// Bootstrap the knowledge base.
    ///
    /// If no persisted index exists, one build from the current document
    /// directory is attempted before serving. A failed bootstrap build (or
    /// a failed load) leaves the knowledge base in the unavailable state
    /// instead of failing process startup.
    #[inline]
    pub async fn init(config: Config, embedder: Arc<dyn Embedder>) -> Self {
        let kb = Self {
            config,
            embedder,
            index: RwLock::new(None),
        };

        if !kb.config.index_dir().is_dir() {
            info!("No persisted index found, attempting bootstrap build");
            let builder = IndexBuilder::new(&kb.config, kb.embedder.as_ref());
            match builder.build().await {
                Ok(report) => {
                    info!("Bootstrap build complete: {} chunks", report.chunk_count);
                }
                Err(e) => {
                    warn!("Bootstrap build failed, queries will degrade: {}", e);
                }
            }
        }

        if let Err(e) = kb.reload().await {
            warn!("Could not load persisted index: {}", e);
        }

        kb
    }

    /// Open the persisted index and atomically swap it in.
    #[inline]
    pub async fn reload(&self) -> Result<()> {
        let index_dir = self.config.index_dir();
        let store = VectorStore::open(&index_dir).await?;

        match IndexManifest::load(&index_dir) {
            Ok(manifest) => {
                if manifest.model != self.embedder.model_id() {
                    // Single pinned model is assumed; flag skew but serve anyway
                    warn!(
                        "Index was built with model '{}' but queries use '{}'",
                        manifest.model,
                        self.embedder.model_id()
                    );
                }
                info!(
                    "Loaded index: {} chunks from {} documents (built {})",
                    manifest.chunk_count, manifest.document_count, manifest.built_at
                );
            }
            Err(e) => warn!("Index manifest unreadable: {}", e),
        }

        *self.index.write().await = Some(Arc::new(store));
        Ok(())
    }

    /// Drop the loaded index; subsequent queries report unavailability.
    #[inline]
    pub async fn teardown(&self) {
        *self.index.write().await = None;
    }

    #[inline]
    pub async fn is_available(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Retrieve the top-k chunks for a question.
    ///
    /// Never fails: an unloaded index, a query-time embedding failure, or a
    /// search error all degrade to [`QueryOutcome::Unavailable`].
    #[inline]
    pub async fn query(&self, question: &str) -> QueryOutcome {
        let store = {
            let guard = self.index.read().await;
            guard.as_ref().map(Arc::clone)
        };
        let Some(store) = store else {
            debug!("Query received while no index is loaded");
            return QueryOutcome::Unavailable;
        };

        let question_vector = match self.embedder.embed(question) {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Failed to embed question: {}", e);
                return QueryOutcome::Unavailable;
            }
        };

        match store
            .search_similar(&question_vector, self.config.retrieval.top_k)
            .await
        {
            Ok(results) => QueryOutcome::Results(
                results
                    .into_iter()
                    .map(|result| RetrievedChunk {
                        content: result.metadata.content,
                        source_file: result.metadata.source_file,
                        similarity: result.similarity_score,
                    })
                    .collect(),
            ),
            Err(e) => {
                warn!("Index search failed: {}", e);
                QueryOutcome::Unavailable
            }
        }
    }

    /// Answer a question end to end: retrieve, then compose.
    ///
    /// Always returns a well-formed [`Answer`].
    #[inline]
    pub async fn answer(&self, question: &str) -> Answer {
        compose(&self.query(question).await)
    }

    /// Load summary information about the persisted index, if any.
    #[inline]
    pub fn manifest(&self) -> Result<IndexManifest> {
        IndexManifest::load(&self.config.index_dir())
    }
}
