//! Statistics generation from the harvested catalog
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics and end-of-run summaries.

use crate::crawler::HarvestSummary;
use crate::extract::NOT_SPECIFIED;
use crate::store::CatalogStore;
use std::collections::HashSet;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of stored postings
    pub total_records: usize,

    /// Number of distinct hiring companies
    pub unique_companies: usize,

    /// Number of distinct locations
    pub unique_locations: usize,

    /// Postings that carry a concrete salary value
    pub with_salary: usize,

    /// Postings whose title fell back to the placeholder
    pub missing_title: usize,
}

/// Loads statistics from the catalog store
///
/// # Arguments
///
/// * `store` - The catalog store to summarize (must be initialized)
pub fn load_statistics(store: &CatalogStore) -> CatalogStatistics {
    let records = store.records();

    let mut companies = HashSet::new();
    let mut locations = HashSet::new();
    let mut with_salary = 0;
    let mut missing_title = 0;

    for record in &records {
        if record.company != NOT_SPECIFIED {
            companies.insert(record.company.clone());
        }
        if record.location != NOT_SPECIFIED {
            locations.insert(record.location.clone());
        }
        if record.salary != NOT_SPECIFIED {
            with_salary += 1;
        }
        if record.title == NOT_SPECIFIED {
            missing_title += 1;
        }
    }

    CatalogStatistics {
        total_records: records.len(),
        unique_companies: companies.len(),
        unique_locations: locations.len(),
        with_salary,
        missing_title,
    }
}

/// Prints catalog statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Stored postings: {}", stats.total_records);
    println!("  Unique companies: {}", stats.unique_companies);
    println!("  Unique locations: {}", stats.unique_locations);
    println!();

    let salary_rate = if stats.total_records > 0 {
        (stats.with_salary as f64 / stats.total_records as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Field coverage: {:.1}% with salary, {} missing a title",
        salary_rate, stats.missing_title
    );
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");
    println!("  Listing pages visited: {}", summary.pages_visited);
    println!("  Postings completed: {}", summary.completed);
    println!("  Postings failed: {}", summary.failed);
    println!("  Records in catalog: {}", summary.stored);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());

    if let Some(reason) = &summary.listing_aborted {
        println!("\n  Listing walk aborted early: {}", reason);
        println!("  Queued postings were still harvested.");
    }
}
