
use std::path::Path;

use tracing::{debug, warn};

use crate::{RagError, Result};

/// Text extracted from a single page of a PDF document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number within the source document
    pub page_number: u32,
    pub text: String,
}

/// One fully loaded source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Filename within the corpus directory, the document's unique key
    pub filename: String,
    pub pages: Vec<PageText>,
}

impl LoadedDocument {
    /// All page texts joined with a single `\n`.
    ///
    /// This is the text stream the chunker runs over; the separator keeps
    /// concatenation deterministic without gluing the last word of one page
    /// to the first word of the next.
    #[inline]
    pub fn combined_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-file result of a corpus load, so callers and tests can assert on
/// skip reasons instead of scraping log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Loaded {
        filename: String,
        page_count: usize,
    },
    Skipped {
        filename: String,
        reason: String,
    },
}

impl FileOutcome {
    #[inline]
    pub fn filename(&self) -> &str {
        match self {
            Self::Loaded { filename, .. } | Self::Skipped { filename, .. } => filename,
        }
    }
}

/// Load every PDF in `dir`, best-effort.
///
/// A corrupt or unreadable file is skipped with a warning and recorded in
/// the outcome list; it never aborts the load. Files are visited in
/// filename order so repeated loads of the same corpus are deterministic.
/// A missing or empty directory yields empty results; deciding that this is
/// fatal (`NoContent`) is the index builder's job.
#[inline]
pub fn load_directory(dir: &Path) -> Result<(Vec<LoadedDocument>, Vec<FileOutcome>)> {
    let mut documents = Vec::new();
    let mut outcomes = Vec::new();

    if !dir.is_dir() {
        debug!("Document directory {} does not exist", dir.display());
        return Ok((documents, outcomes));
    }

    let mut pdf_files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| has_pdf_extension(path))
        .collect();
    pdf_files.sort();

    for path in pdf_files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match load_document(&path) {
            Ok(document) => {
                debug!("Loaded {} ({} pages)", filename, document.pages.len());
                outcomes.push(FileOutcome::Loaded {
                    filename,
                    page_count: document.pages.len(),
                });
                documents.push(document);
            }
            Err(e) => {
                warn!("Skipped {}: {}", filename, e);
                outcomes.push(FileOutcome::Skipped {
                    filename,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok((documents, outcomes))
}

/// Extract per-page text from a single PDF file.
#[inline]
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pdf = lopdf::Document::load(path)
        .map_err(|e| RagError::Pdf(format!("failed to parse {}: {}", filename, e)))?;

    let mut pages = Vec::new();
    for (page_number, _) in pdf.get_pages() {
        match pdf.extract_text(&[page_number]) {
            Ok(text) => pages.push(PageText { page_number, text }),
            Err(e) => {
                // One unreadable page does not invalidate the document.
                warn!(
                    "Could not extract text from {} page {}: {}",
                    filename, page_number, e
                );
            }
        }
    }

    if pages.iter().all(|page| page.text.trim().is_empty()) {
        return Err(RagError::Pdf(format!(
            "{} contains no extractable text",
            filename
        )));
    }

    Ok(LoadedDocument { filename, pages })
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}
