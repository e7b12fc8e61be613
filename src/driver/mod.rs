//! Rendering-driver capability consumed by the crawler and workers
//!
//! The core never talks to a browser or HTTP client directly; it drives an
//! abstract page session: open a URL, wait for content to settle, read the
//! rendered markup, and run selector queries. Two bindings are provided:
//! - [`CdpFactory`]: a Chrome DevTools Protocol session against a running
//!   browser's debug endpoint
//! - [`HttpFactory`]: plain HTTP fetches for fully server-rendered sites
//!
//! Sessions are never shared: the listing walk owns one, and each worker
//! acquires its own through a [`SessionFactory`].

mod cdp;
mod http;

pub use cdp::CdpFactory;
pub use http::HttpFactory;

use crate::config::{DriverConfig, DriverKind};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while driving a page session
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to connect to driver at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Query '{selector}' failed: {message}")]
    Query { selector: String, message: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Operation not supported by this driver: {0}")]
    Unsupported(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// A handle to one element on the rendered page
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Reads an attribute value, None when the attribute is absent
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// Reads the element's visible text
    async fn text(&self) -> DriverResult<String>;

    /// Clicks the element
    async fn click(&self) -> DriverResult<()>;
}

/// One isolated page session
///
/// After `wait_until_stable` resolves, `content` and `query_all` reflect
/// the fully rendered page.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigates the session to the given URL
    async fn open(&self, url: &str) -> DriverResult<()>;

    /// Waits until the page content has settled
    async fn wait_until_stable(&self) -> DriverResult<()>;

    /// Returns the full rendered markup
    async fn content(&self) -> DriverResult<String>;

    /// Returns handles to every element matching the CSS selector
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>>;

    /// Releases the session's resources
    async fn close(&self) -> DriverResult<()>;
}

/// Creates isolated page sessions
///
/// The listing walk takes one session; every worker takes its own, so a
/// worker crash can never disturb another worker's page.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn new_session(&self) -> DriverResult<Box<dyn PageSession>>;
}

/// Builds the session factory selected by the configuration
pub fn build_factory(config: &DriverConfig) -> DriverResult<Arc<dyn SessionFactory>> {
    match config.kind {
        DriverKind::Cdp => Ok(Arc::new(CdpFactory::new(&config.endpoint))),
        DriverKind::Http => Ok(Arc::new(HttpFactory::new()?)),
    }
}
