use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::answer::Answer;
use crate::config::{Config, EmbeddingProvider, default_base_dir};
use crate::corpus;
use crate::embeddings::{Embedder, OllamaClient, embedder_from_config};
use crate::index::{BuildReport, IndexBuilder, IndexManifest};
use crate::loader::FileOutcome;
use crate::query::KnowledgeBase;

fn resolve_config(base_dir: Option<PathBuf>) -> Result<Config> {
    let base_dir = match base_dir {
        Some(dir) => dir,
        None => default_base_dir().context("Could not determine data directory")?,
    };
    Config::load(&base_dir)
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder = embedder_from_config(config).context("Failed to initialize embedder")?;
    Ok(Arc::from(embedder))
}

fn print_report(report: &BuildReport) {
    println!(
        "Indexed {} chunks from {} documents.",
        report.chunk_count, report.document_count
    );
    for outcome in &report.outcomes {
        if let FileOutcome::Skipped { filename, reason } = outcome {
            println!("  Skipped {}: {}", filename, reason);
        }
    }
}

/// Fail fast if the configured embedding service is unreachable, before
/// any documents are loaded or chunked.
fn check_embedding_service(config: &Config) -> Result<()> {
    if config.embedding.provider == EmbeddingProvider::Ollama {
        OllamaClient::new(config)?
            .ping()
            .context("Ollama embedding service is not reachable")?;
    }
    Ok(())
}

async fn rebuild(config: &Config, embedder: &dyn Embedder) -> Result<BuildReport> {
    check_embedding_service(config)?;
    let report = IndexBuilder::new(config, embedder)
        .build()
        .await
        .context("Index rebuild failed")?;
    Ok(report)
}

/// Rebuild the vector index from every PDF currently in the corpus.
#[inline]
pub async fn build_index(base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;
    let embedder = build_embedder(&config)?;

    info!("Rebuilding index from {}", config.documents_dir().display());
    let report = rebuild(&config, embedder.as_ref()).await?;
    print_report(&report);

    Ok(())
}

/// Answer a single admission question from the persisted index.
#[inline]
pub async fn ask(question: String, base_dir: Option<PathBuf>) -> Result<Answer> {
    let config = resolve_config(base_dir)?;
    let embedder = build_embedder(&config)?;

    let kb = KnowledgeBase::init(config, embedder).await;
    let answer = kb.answer(&question).await;

    println!("{}", answer.short_answer);
    println!();
    println!("{}", answer.full_answer);

    Ok(answer)
}

/// Copy a PDF into the corpus and rebuild the index.
#[inline]
pub async fn add_document(path: PathBuf, base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;
    let embedder = build_embedder(&config)?;

    let filename = corpus::add_document_from_path(&config, Path::new(&path))
        .with_context(|| format!("Failed to add {}", path.display()))?;
    println!("Added {} to the corpus.", filename);

    let report = rebuild(&config, embedder.as_ref()).await?;
    print_report(&report);

    Ok(())
}

/// Delete a PDF from the corpus and rebuild the index.
#[inline]
pub async fn remove_document(filename: String, base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;
    let embedder = build_embedder(&config)?;

    let existed = corpus::remove_document(&config, &filename)
        .with_context(|| format!("Failed to remove {}", filename))?;
    if existed {
        println!("Removed {} from the corpus.", filename);
    } else {
        println!("{} was not in the corpus.", filename);
    }

    match rebuild(&config, embedder.as_ref()).await {
        Ok(report) => print_report(&report),
        Err(e) if e.downcast_ref::<crate::RagError>()
            .is_some_and(|e| matches!(e, crate::RagError::NoContent)) =>
        {
            warn!("Corpus is empty, previous index left in place");
            println!("The corpus is now empty; the previous index remains until documents are added.");
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// List the PDFs currently in the corpus.
#[inline]
pub fn list_documents(base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;
    let filenames = corpus::list_documents(&config).context("Failed to list corpus")?;

    if filenames.is_empty() {
        println!("The corpus is empty.");
        println!("Use 'admission-rag add <path>' to add a PDF.");
        return Ok(());
    }

    println!("Corpus documents ({} total):", filenames.len());
    for filename in &filenames {
        println!("  {}", filename);
    }

    Ok(())
}

/// Show the state of the persisted index and the corpus.
#[inline]
pub fn show_status(base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;

    let filenames = corpus::list_documents(&config).context("Failed to list corpus")?;
    println!("Corpus: {} documents in {}", filenames.len(), config.documents_dir().display());

    match config.embedding.provider {
        EmbeddingProvider::Ollama => match check_embedding_service(&config) {
            Ok(()) => println!("Embedding service: Ollama reachable"),
            Err(e) => println!("Embedding service: unreachable ({:#})", e),
        },
        EmbeddingProvider::CharNgram => {
            println!("Embedding service: offline char-ngram embedder");
        }
    }

    match IndexManifest::load(&config.index_dir()) {
        Ok(manifest) => {
            println!("Index: {} chunks from {} documents", manifest.chunk_count, manifest.document_count);
            println!("  Model: {}", manifest.model);
            println!("  Dimension: {}", manifest.dimension);
            println!("  Built: {}", manifest.built_at);
        }
        Err(_) => {
            println!("Index: not built");
            println!("Use 'admission-rag build' to build it.");
        }
    }

    Ok(())
}

/// Print the active configuration as TOML.
#[inline]
pub fn show_config(base_dir: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(base_dir)?;

    println!("Base directory: {}", config.base_dir.display());
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    println!("{}", rendered);

    Ok(())
}
