//! Persistence module for the harvested-posting catalog
//!
//! This module owns durable storage for harvest results, including:
//! - Loading and recovering the catalog across runs
//! - Deduplicated, incrementally persisted record additions
//! - Timestamped backup snapshots

mod catalog;

pub use catalog::CatalogStore;

use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations
pub type StoreResult<T> = Result<T, StoreError>;
