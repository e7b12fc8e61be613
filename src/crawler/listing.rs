//! Listing-page walker
//!
//! This module walks the paginated search results one page at a time over
//! a single driver session, extracting candidate postings and enqueueing
//! the ones not already harvested. Candidate extraction is a pure parse of
//! the rendered markup; pagination signals (next affordance, max page
//! count) are read live through the driver's element queries.

use crate::config::{DelayConfig, SearchConfig, SearchMode};
use crate::driver::{DriverResult, PageSession};
use crate::queue::{HarvestTask, TaskQueue};
use crate::Result;
use rand::Rng;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use url::Url;

/// Hard ceiling on pages walked, regardless of pagination signals
///
/// Malformed pagination controls must never produce an unbounded walk.
pub const PAGE_SAFETY_CEILING: u32 = 500;

/// Fixed backoff between retries of the same listing page
const PAGE_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Card and pagination selectors for the listing markup
const CARD_SELECTOR: &str = "[data-job-id], .job-card, article.job";
const NEXT_SELECTOR: &str = "a[rel='next'], a.next-page, button.next-page";
const PAGINATION_SELECTOR: &str = ".pagination a, .pagination button";
const TOTAL_SELECTOR: &str = ".results-count, .total-count";

/// One candidate posting scraped from a listing card
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub url: String,
    pub preview: HashMap<String, String>,
}

/// Pure parse of one listing page
#[derive(Debug)]
pub struct ParsedListing {
    pub candidates: Vec<Candidate>,

    /// Site-reported total result count, informational only
    pub total_count: Option<u32>,
}

/// Result of a full listing walk
#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub pages_visited: u32,
    pub candidates_seen: usize,
    pub enqueued: usize,
    pub total_listed: Option<u32>,

    /// Set when the page retry budget was exhausted mid-walk; everything
    /// enqueued before the abort is preserved
    pub aborted: Option<String>,
}

/// Walks the paginated listing and fills the task queue
pub struct ListingCrawler<'a> {
    session: &'a dyn PageSession,
    search: &'a SearchConfig,
    delay: DelayConfig,
    max_pages: u32,
    retry_attempts: u32,
}

impl<'a> ListingCrawler<'a> {
    pub fn new(
        session: &'a dyn PageSession,
        search: &'a SearchConfig,
        delay: DelayConfig,
        max_pages: u32,
        retry_attempts: u32,
    ) -> Self {
        Self {
            session,
            search,
            delay,
            max_pages,
            retry_attempts,
        }
    }

    /// Walks listing pages until a termination signal fires
    ///
    /// Candidates whose ids are already stored (`known_ids`) or already
    /// enqueued in this run are skipped. A page that keeps failing after
    /// the retry budget aborts the walk; the outcome records the reason
    /// and keeps everything enqueued so far.
    pub async fn walk(&self, queue: &TaskQueue, known_ids: &HashSet<String>) -> Result<ListingOutcome> {
        let mut outcome = ListingOutcome::default();
        let mut page = 1u32;

        loop {
            let page_url = build_page_url(self.search, page)?;
            tracing::info!("Fetching listing page {} ({})", page, page_url);

            let html = match self.fetch_page_with_retry(page_url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!(
                        "Listing page {} failed after {} attempts: {}",
                        page,
                        self.retry_attempts,
                        e
                    );
                    outcome.aborted = Some(format!("page {}: {}", page, e));
                    return Ok(outcome);
                }
            };

            outcome.pages_visited = page;

            let parsed = parse_listing(&html, &page_url);
            if let Some(total) = parsed.total_count {
                outcome.total_listed = Some(total);
            }
            outcome.candidates_seen += parsed.candidates.len();

            let mut enqueued_this_page = 0;
            for candidate in parsed.candidates {
                if known_ids.contains(&candidate.id) {
                    tracing::debug!("Candidate {} already stored, skipping", candidate.id);
                    continue;
                }
                let task =
                    HarvestTask::new(candidate.id, candidate.url).with_preview(candidate.preview);
                if queue.enqueue(task) {
                    enqueued_this_page += 1;
                }
            }
            outcome.enqueued += enqueued_this_page;

            tracing::info!(
                "Page {}: {} new tasks enqueued ({} pending total)",
                page,
                enqueued_this_page,
                queue.stats().pending
            );

            // Termination: next affordance missing, configured cap, inferred
            // max page, or the safety ceiling
            let has_next = self.next_page_available().await?;
            if !has_next {
                tracing::info!("No next-page affordance on page {}, walk complete", page);
                break;
            }
            if self.max_pages != 0 && page >= self.max_pages {
                tracing::info!("Reached configured page cap of {}", self.max_pages);
                break;
            }
            if let Some(max_hint) = self.inferred_max_page().await? {
                if page >= max_hint {
                    tracing::info!("Reached last rendered pagination entry ({})", max_hint);
                    break;
                }
            }
            if page >= PAGE_SAFETY_CEILING {
                tracing::warn!(
                    "Hit safety ceiling of {} pages, stopping walk",
                    PAGE_SAFETY_CEILING
                );
                break;
            }

            self.inter_page_delay().await;
            page += 1;
        }

        Ok(outcome)
    }

    /// Fetches one listing page, retrying with a fixed backoff
    async fn fetch_page_with_retry(&self, url: &str) -> DriverResult<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_page(url).await {
                Ok(html) => return Ok(html),
                Err(e) if attempt < self.retry_attempts => {
                    tracing::warn!(
                        "Listing fetch attempt {}/{} for {} failed: {}",
                        attempt,
                        self.retry_attempts,
                        url,
                        e
                    );
                    tokio::time::sleep(PAGE_RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> DriverResult<String> {
        self.session.open(url).await?;
        self.session.wait_until_stable().await?;
        self.session.content().await
    }

    /// Checks for a clickable, non-disabled next-page element
    async fn next_page_available(&self) -> DriverResult<bool> {
        for element in self.session.query_all(NEXT_SELECTOR).await? {
            if element.attribute("disabled").await?.is_some() {
                continue;
            }
            if let Some(class) = element.attribute("class").await? {
                if class.split_whitespace().any(|c| c == "disabled") {
                    continue;
                }
            }
            if element.attribute("aria-disabled").await?.as_deref() == Some("true") {
                continue;
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Largest page number visible in the rendered pagination controls
    async fn inferred_max_page(&self) -> DriverResult<Option<u32>> {
        let mut max_page = None;
        for element in self.session.query_all(PAGINATION_SELECTOR).await? {
            if let Ok(number) = element.text().await?.trim().parse::<u32>() {
                max_page = Some(max_page.map_or(number, |m: u32| m.max(number)));
            }
        }
        Ok(max_page)
    }

    /// Randomized politeness delay between listing pages
    async fn inter_page_delay(&self) {
        let ms = rand::rng().random_range(self.delay.min_ms..=self.delay.max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Builds the listing URL for a given page number
///
/// Page 1 is the bare search URL; later pages carry a `page` parameter.
pub fn build_page_url(search: &SearchConfig, page: u32) -> std::result::Result<Url, url::ParseError> {
    let mut url = match search.mode {
        SearchMode::Keyword => {
            let mut url = Url::parse(&search.base_url)?;
            url.set_path("/jobs");
            url.query_pairs_mut().append_pair("q", &search.query);
            url
        }
        SearchMode::Category => {
            let mut url = Url::parse(&search.base_url)?;
            url.set_path(&format!("/jobs/category/{}", search.query));
            url
        }
        SearchMode::CustomUrl => Url::parse(&search.query)?,
    };

    if page > 1 {
        url.query_pairs_mut().append_pair("page", &page.to_string());
    }

    Ok(url)
}

/// Parses one listing page into candidates and the reported total
///
/// Pure function over the rendered markup, so it behaves identically for
/// every driver binding.
pub fn parse_listing(html: &str, base_url: &Url) -> ParsedListing {
    let document = Html::parse_document(html);

    let mut candidates = Vec::new();
    if let Ok(card_selector) = Selector::parse(CARD_SELECTOR) {
        for card in document.select(&card_selector) {
            if let Some(candidate) = parse_card(&card, base_url) {
                candidates.push(candidate);
            }
        }
    }

    ParsedListing {
        candidates,
        total_count: parse_total_count(&document),
    }
}

/// Extracts one candidate from a listing card
///
/// Cards without a usable detail link are dropped.
fn parse_card(card: &scraper::ElementRef<'_>, base_url: &Url) -> Option<Candidate> {
    let link_selector = Selector::parse("a[href]").ok()?;
    let href = card
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let url = base_url.join(href.trim()).ok()?;

    let id = card
        .value()
        .attr("data-job-id")
        .map(str::to_string)
        .or_else(|| slug_from_url(&url))?;

    let mut preview = HashMap::new();
    for (key, selectors) in [
        ("title", ".job-title, h2, h3"),
        ("company", ".company-name, .company"),
        ("location", ".job-location, .location"),
        ("salary", ".salary-range, .salary"),
        ("posted_date", ".posted-date, time"),
    ] {
        if let Ok(selector) = Selector::parse(selectors) {
            if let Some(element) = card.select(&selector).next() {
                let text = element
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ");
                if !text.is_empty() {
                    preview.insert(key.to_string(), text);
                }
            }
        }
    }

    Some(Candidate {
        id,
        url: url.to_string(),
        preview,
    })
}

/// Last non-empty path segment, used as a fallback candidate id
fn slug_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Reads the site-reported total result count, when rendered
fn parse_total_count(document: &Html) -> Option<u32> {
    let selector = Selector::parse(TOTAL_SELECTOR).ok()?;
    let text = document
        .select(&selector)
        .next()
        .map(|e| e.text().collect::<String>())?;

    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
