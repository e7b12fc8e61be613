//! Data model for harvested postings and the persisted catalog
//!
//! This module defines the record produced for each detail page and the
//! on-disk catalog document that collects them.

use serde::{Deserialize, Serialize};

/// Version string written into every catalog document
pub const CATALOG_FORMAT_VERSION: &str = "1.0";

/// A fully extracted job posting from one detail page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    /// Stable identifier, unique across runs
    pub id: String,

    /// Position title
    pub title: String,

    /// Hiring organization
    pub company: String,

    /// Logo image reference (URL or empty placeholder)
    pub logo: String,

    /// Location as displayed on the posting
    pub location: String,

    /// Compensation text as displayed on the posting
    pub salary: String,

    /// Free-text role description
    pub description: String,

    /// Free-text requirements/qualifications section
    pub requirements: String,

    /// Free-text benefits section
    pub benefits: String,

    /// URL the posting was fetched from
    pub source_url: String,

    /// Posted date as displayed (absolute or relative)
    pub posted_date: String,

    /// RFC 3339 timestamp of the fetch
    pub scraped_at: String,
}

/// Metadata block of the persisted catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Number of records in the document, kept equal to records.len()
    pub total_records: usize,

    /// RFC 3339 timestamp of the last write
    pub last_updated: String,

    /// Catalog format version
    pub format_version: String,
}

/// The persisted catalog document
///
/// Every write produces a complete, self-describing document, so the file
/// on disk is valid after each successful record addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,

    /// Set only on backup snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_date: Option<String>,

    pub records: Vec<Posting>,
}

impl Catalog {
    /// Creates an empty catalog with fresh metadata
    pub fn empty() -> Self {
        Self {
            metadata: CatalogMetadata {
                total_records: 0,
                last_updated: chrono::Utc::now().to_rfc3339(),
                format_version: CATALOG_FORMAT_VERSION.to_string(),
            },
            backup_date: None,
            records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_posting(id: &str) -> Posting {
        Posting {
            id: id.to_string(),
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            logo: String::new(),
            location: "Remote".to_string(),
            salary: "$120k".to_string(),
            description: "Build things".to_string(),
            requirements: "Rust".to_string(),
            benefits: "Health".to_string(),
            source_url: "https://jobs.example.com/j/1".to_string(),
            posted_date: "2026-01-01".to_string(),
            scraped_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert_eq!(catalog.metadata.total_records, 0);
        assert_eq!(catalog.metadata.format_version, CATALOG_FORMAT_VERSION);
        assert!(catalog.records.is_empty());
        assert!(catalog.backup_date.is_none());
    }

    #[test]
    fn test_catalog_roundtrip() {
        let mut catalog = Catalog::empty();
        catalog.records.push(sample_posting("j-1"));
        catalog.metadata.total_records = 1;

        let json = serde_json::to_string_pretty(&catalog).unwrap();
        let parsed: Catalog = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.metadata.total_records, 1);
        assert_eq!(parsed.records[0].id, "j-1");
        // backup_date is omitted from primary catalogs
        assert!(!json.contains("backup_date"));
    }
}
