// Embeddings module
// Maps chunk and question text to fixed-length dense vectors

pub mod ngram;
pub mod ollama;

pub use ngram::CharNgramEmbedder;
pub use ollama::OllamaClient;

use crate::Result;
use crate::config::{Config, EmbeddingProvider};

/// A fixed-dimension text embedding backend.
///
/// Implementations must be deterministic for a pinned model: embedding the
/// same text twice yields bitwise-identical vectors. The index builder and
/// the query engine share one embedder instance, so build-time and
/// query-time vectors always come from the same model.
pub trait Embedder: Send + Sync {
    /// Stable model identifier, recorded in the index manifest.
    fn model_id(&self) -> String;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, preserving order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Construct the embedder selected by the configuration.
#[inline]
pub fn embedder_from_config(config: &Config) -> Result<Box<dyn Embedder>> {
    match config.embedding.provider {
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaClient::new(config)?)),
        EmbeddingProvider::CharNgram => Ok(Box::new(CharNgramEmbedder::new(
            config.embedding.dimension as usize,
        ))),
    }
}
