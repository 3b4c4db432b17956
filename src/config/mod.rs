// Configuration management module
// TOML-backed settings for corpus paths, embedding provider, and retrieval

pub mod settings;

pub use settings::{
    Config, ConfigError, EmbeddingConfig, EmbeddingProvider, OllamaConfig, RetrievalConfig,
};

/// Get the default base directory for corpus, index, and config files
#[inline]
pub fn default_base_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("admission-rag"))
        .ok_or(ConfigError::DirectoryError)
}
