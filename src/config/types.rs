use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub harvest: HarvestConfig,
    pub driver: DriverConfig,
    pub delay: DelayConfig,
    pub output: OutputConfig,
}

/// How the listing walk is seeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Free-text search term appended as a query parameter
    Keyword,

    /// Category slug appended to the category path
    Category,

    /// The query field is a complete listing URL, used as-is
    CustomUrl,
}

/// Search configuration: which listing pages to walk
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Seeding mode for the listing walk
    pub mode: SearchMode,

    /// Search term, category slug, or full URL depending on mode
    pub query: String,

    /// Base URL of the listing site
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Harvest behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Number of concurrent detail-page workers
    pub workers: u32,

    /// Maximum listing pages to walk (0 = unbounded)
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Processing attempts before a task fails permanently
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,
}

/// Which rendering-driver binding to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Chrome DevTools Protocol session against a running browser
    Cdp,

    /// Plain HTTP fetches for fully server-rendered sites
    Http,
}

/// Rendering-driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    pub kind: DriverKind,

    /// Debug endpoint of the running browser (CDP only)
    pub endpoint: String,
}

/// Randomized inter-request delay bounds
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelayConfig {
    /// Minimum delay between requests (milliseconds)
    #[serde(rename = "min-ms")]
    pub min_ms: u64,

    /// Maximum delay between requests (milliseconds)
    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON catalog file
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,
}
