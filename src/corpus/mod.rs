//! Manages the PDF corpus directory backing the index.
//!
//! These operations only touch the filesystem. Callers are responsible for
//! rebuilding the index after every mutation; the persisted index never
//! observes a half-applied corpus because the rebuild reads the directory
//! in one pass.

#[cfg(test)]
mod tests;

use std::fs;

use tracing::info;

use crate::config::Config;
use crate::{RagError, Result};

/// Validate a corpus filename: `.pdf` extension, no path components.
fn validate_filename(filename: &str) -> Result<()> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(RagError::InvalidDocument(format!(
            "Filename must not contain path components: {}",
            filename
        )));
    }

    let lowered = filename.to_lowercase();
    if !lowered.ends_with(".pdf") || lowered == ".pdf" {
        return Err(RagError::InvalidDocument(format!(
            "Only PDF files are allowed: {}",
            filename
        )));
    }

    Ok(())
}

/// Write a PDF into the corpus directory, replacing any existing file of
/// the same name.
#[inline]
pub fn add_document(config: &Config, filename: &str, bytes: &[u8]) -> Result<()> {
    validate_filename(filename)?;

    let documents_dir = config.documents_dir();
    fs::create_dir_all(&documents_dir)?;

    let target = documents_dir.join(filename);
    let replaced = target.exists();
    fs::write(&target, bytes)?;

    info!(
        "{} document '{}' ({} bytes)",
        if replaced { "Replaced" } else { "Added" },
        filename,
        bytes.len()
    );
    Ok(())
}

/// Copy a PDF from an arbitrary path into the corpus directory.
#[inline]
pub fn add_document_from_path(config: &Config, source: &std::path::Path) -> Result<String> {
    let filename = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            RagError::InvalidDocument(format!("Not a usable filename: {}", source.display()))
        })?
        .to_string();

    let bytes = fs::read(source)?;
    add_document(config, &filename, &bytes)?;
    Ok(filename)
}

/// Delete a PDF from the corpus directory.
///
/// Returns whether the file existed. Removing an absent document is not an
/// error; the corpus ends up in the requested state either way.
#[inline]
pub fn remove_document(config: &Config, filename: &str) -> Result<bool> {
    validate_filename(filename)?;

    let target = config.documents_dir().join(filename);
    if !target.is_file() {
        info!("Document '{}' was not present in the corpus", filename);
        return Ok(false);
    }

    fs::remove_file(&target)?;
    info!("Removed document '{}'", filename);
    Ok(true)
}

/// List corpus PDF filenames, sorted.
///
/// A missing corpus directory is an empty corpus.
#[inline]
pub fn list_documents(config: &Config) -> Result<Vec<String>> {
    let documents_dir = config.documents_dir();
    if !documents_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut filenames: Vec<String> = fs::read_dir(&documents_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.to_lowercase().ends_with(".pdf"))
        .collect();
    filenames.sort();

    Ok(filenames)
}
