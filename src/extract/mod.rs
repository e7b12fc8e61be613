//! Field-extraction capability consumed by the worker pool
//!
//! Extraction is a pure function from rendered markup to a [`Posting`];
//! the harvesting core never inspects page structure itself. Implementors
//! must fill every field, using [`NOT_SPECIFIED`] for anything they cannot
//! determine, so downstream code never sees an absent value.

mod heuristics;

pub use heuristics::HeuristicExtractor;

use crate::model::Posting;
use std::collections::HashMap;

/// Placeholder written into any field the extractor cannot determine
pub const NOT_SPECIFIED: &str = "Not specified";

/// Extracts structured posting fields from rendered detail-page markup
pub trait Extractor: Send + Sync {
    /// Pure extraction: same content and URL always yield the same posting
    fn extract(&self, content: &str, source_url: &str) -> Posting;
}

/// Merges listing-card preview values into an extracted posting
///
/// The detail-page value wins unless it is the [`NOT_SPECIFIED`] sentinel;
/// then the preview value is used when present and non-empty, and the
/// sentinel stands otherwise.
pub fn merge_preview(mut posting: Posting, preview: &HashMap<String, String>) -> Posting {
    posting.title = resolve(posting.title, preview.get("title"));
    posting.company = resolve(posting.company, preview.get("company"));
    posting.logo = resolve(posting.logo, preview.get("logo"));
    posting.location = resolve(posting.location, preview.get("location"));
    posting.salary = resolve(posting.salary, preview.get("salary"));
    posting.posted_date = resolve(posting.posted_date, preview.get("posted_date"));
    posting
}

fn resolve(detail: String, preview: Option<&String>) -> String {
    if detail != NOT_SPECIFIED {
        return detail;
    }
    match preview {
        Some(value) if !value.is_empty() => value.clone(),
        _ => NOT_SPECIFIED.to_string(),
    }
}
