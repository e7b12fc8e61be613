//! Output module for catalog statistics and run summaries
//!
//! This module handles:
//! - Summarizing the harvested catalog for the --stats CLI mode
//! - Printing the end-of-run harvest report

pub mod stats;

pub use stats::{load_statistics, print_statistics, print_summary, CatalogStatistics};
