use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No readable PDF documents found in the corpus directory")]
    NoContent,

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod answer;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod query;
