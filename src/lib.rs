//! Gleaner: a job-listing harvester
//!
//! This crate crawls a paginated listing site, discovers individual posting
//! URLs, fetches each detail page with a bounded pool of concurrent workers,
//! and persists results incrementally so that a crash loses no completed work.

pub mod config;
pub mod crawler;
pub mod driver;
pub mod extract;
pub mod model;
pub mod output;
pub mod queue;
pub mod store;
pub mod worker;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Catalog store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Catalog, Posting};
pub use queue::{HarvestTask, TaskQueue, TaskState};
pub use store::CatalogStore;
