
use std::collections::BTreeSet;

use itertools::Itertools;

use crate::query::{QueryOutcome, RetrievedChunk};

/// The response returned for every question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Rule-derived bullet summary
    pub short_answer: String,
    /// Verbatim retrieved passages with source attribution
    pub full_answer: String,
}

const UNAVAILABLE_SHORT: &str = "Knowledge base is not available.";
const UNAVAILABLE_FULL: &str =
    "The document index is not ready. Please contact an administrator.";

const NO_RESULTS_SHORT: &str = "No relevant admission information found.";
const NO_RESULTS_FULL: &str =
    "The provided documents do not contain information related to this question.";

const FALLBACK_SHORT: &str =
    "Relevant admission information is available in the official documents.";

const SOURCE_SUFFIX: &str = "(Source: University Admission Documents)";

struct KeywordRule {
    /// Any of these substrings in normalized chunk text triggers the rule
    keywords: &'static [&'static str],
    bullet: &'static str,
}

// Every bullet is traceable to a literal substring match in retrieved
// text, which is what makes the short answer hallucination-free.
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["entry test"],
        bullet: "Admission is based on Pre-Admission Entry Test merit",
    },
    KeywordRule {
        keywords: &["hsc", "equivalent"],
        bullet: "HSC-II or equivalent qualification is mandatory",
    },
    KeywordRule {
        keywords: &["50%"],
        bullet: "Minimum 50% marks required to apply",
    },
    KeywordRule {
        keywords: &["60%"],
        bullet: "Minimum 60% marks required for Engineering / BS programs",
    },
    KeywordRule {
        keywords: &["documents"],
        bullet: "Required academic documents must be submitted",
    },
];

/// Collapse all whitespace runs (including newlines) to single spaces.
#[inline]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Compose the final answer for a retrieval outcome.
///
/// Pure and deterministic: no model call is involved, so two identical
/// retrieval outcomes always render the same answer.
#[inline]
pub fn compose(outcome: &QueryOutcome) -> Answer {
    let chunks = match outcome {
        QueryOutcome::Unavailable => {
            return Answer {
                short_answer: UNAVAILABLE_SHORT.to_string(),
                full_answer: UNAVAILABLE_FULL.to_string(),
            };
        }
        QueryOutcome::Results(chunks) if chunks.is_empty() => {
            return Answer {
                short_answer: NO_RESULTS_SHORT.to_string(),
                full_answer: NO_RESULTS_FULL.to_string(),
            };
        }
        QueryOutcome::Results(chunks) => chunks,
    };

    let full_body = chunks
        .iter()
        .map(|chunk| clean_text(&chunk.content))
        .join("\n\n");

    Answer {
        short_answer: build_short_answer(chunks),
        full_answer: format!("{}\n\n{}", full_body, SOURCE_SUFFIX),
    }
}

/// Derive the bullet summary from retrieved chunks.
///
/// Bullets triggered by any chunk are collected as a set (duplicates
/// across chunks collapse) and rendered alphabetically sorted.
fn build_short_answer(chunks: &[RetrievedChunk]) -> String {
    // BTreeSet gives both deduplication and alphabetical order
    let mut bullets = BTreeSet::new();

    for chunk in chunks {
        let text = clean_text(&chunk.content).to_lowercase();
        for rule in KEYWORD_RULES {
            if rule.keywords.iter().any(|keyword| text.contains(keyword)) {
                bullets.insert(rule.bullet);
            }
        }
    }

    if bullets.is_empty() {
        return FALLBACK_SHORT.to_string();
    }

    bullets
        .iter()
        .map(|bullet| format!("• {}", bullet))
        .join("\n")
}
