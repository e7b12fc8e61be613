//! Crawling module for listing discovery and harvest orchestration
//!
//! This module contains the core crawl logic, including:
//! - The paginated listing walker that discovers posting candidates
//! - Pure parsing of listing markup into tasks
//! - The coordinator that sequences the listing and harvest phases

mod coordinator;
mod listing;

pub use coordinator::{run_harvest, Coordinator, HarvestSummary, StopHandle};
pub use listing::{
    build_page_url, parse_listing, Candidate, ListingCrawler, ListingOutcome, ParsedListing,
    PAGE_SAFETY_CEILING,
};

use crate::config::Config;
use crate::Result;

/// Runs a complete harvest operation
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Initialize the catalog store (recovering prior results)
/// 2. Walk the listing pages and enqueue new postings
/// 3. Drain the queue with the bounded worker pool
/// 4. Write a backup snapshot and report final counts
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Harvest completed with these final counts
/// * `Err(GleanError)` - Harvest failed
pub async fn harvest(config: Config) -> Result<HarvestSummary> {
    run_harvest(config).await
}
