//! Heuristic field extraction from posting detail pages
//!
//! Listing sites rarely agree on markup, so every field is resolved
//! through a chain of candidates tried in a fixed order: structured
//! selectors first (microdata, data attributes, well-known class names),
//! then looser selectors, then regex scans over the page text. The first
//! non-empty hit wins; a field with no hit gets the sentinel.

use crate::extract::{Extractor, NOT_SPECIFIED};
use crate::model::Posting;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Selector chains, most specific first
const TITLE_SELECTORS: &[&str] = &[
    "[data-testid='job-title']",
    "h1.job-title",
    ".job-title",
    "[itemprop='title']",
    "h1",
];

const COMPANY_SELECTORS: &[&str] = &[
    "[data-testid='company-name']",
    "[itemprop='hiringOrganization']",
    ".company-name",
    ".company",
];

const LOGO_SELECTORS: &[&str] = &[".company-logo img", "img.company-logo", "img[alt$='logo']"];

const LOCATION_SELECTORS: &[&str] = &[
    "[data-testid='job-location']",
    "[itemprop='jobLocation']",
    ".job-location",
    ".location",
];

const SALARY_SELECTORS: &[&str] = &[
    "[data-testid='salary']",
    "[itemprop='baseSalary']",
    ".salary-range",
    ".salary",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "[data-testid='job-description']",
    "[itemprop='description']",
    ".job-description",
    "#job-description",
];

const POSTED_SELECTORS: &[&str] = &[".posted-date", "[data-testid='posted-date']", "time"];

/// Selector/regex-chain extractor with a deterministic fallback order
pub struct HeuristicExtractor {
    salary_pattern: Regex,
    posted_pattern: Regex,
    requirements_heading: Regex,
    benefits_heading: Regex,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            // $80,000 - $120,000 / 45k-60k per year / $35/hour
            salary_pattern: Regex::new(
                r"(?i)[$€£]\s?\d[\d,.]*\s?k?(?:\s*[-–]\s*[$€£]?\s?\d[\d,.]*\s?k?)?(?:\s*(?:per|/)\s*(?:year|yr|annum|month|hour|hr))?",
            )
            .expect("salary pattern"),
            // "Posted 3 days ago", "Posted on January 5, 2026", "2 weeks ago"
            posted_pattern: Regex::new(
                r"(?i)(?:posted\s+(?:on\s+)?)?(\d+\s+(?:day|week|month|hour)s?\s+ago|\w+\s+\d{1,2},\s+\d{4}|\d{4}-\d{2}-\d{2})",
            )
            .expect("posted-date pattern"),
            requirements_heading: Regex::new(r"(?i)^(requirements|qualifications|what you.ll need)")
                .expect("requirements heading pattern"),
            benefits_heading: Regex::new(r"(?i)^(benefits|perks|what we offer)")
                .expect("benefits heading pattern"),
        }
    }

    /// Returns the first non-empty text match across a selector chain
    fn select_text(document: &Html, selectors: &[&str]) -> Option<String> {
        for raw in selectors {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(&element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Returns the first non-empty attribute match across a selector chain
    fn select_attr(document: &Html, selectors: &[&str], attr: &str) -> Option<String> {
        for raw in selectors {
            let Ok(selector) = Selector::parse(raw) else {
                continue;
            };
            for element in document.select(&selector) {
                if let Some(value) = element.value().attr(attr) {
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
        None
    }

    /// Collects the text between a matching section heading and the next heading
    fn section_after_heading(&self, document: &Html, heading: &Regex) -> Option<String> {
        let selector = Selector::parse("h2, h3, h4").ok()?;

        for element in document.select(&selector) {
            let heading_text = element_text(&element);
            if !heading.is_match(&heading_text) {
                continue;
            }

            let mut parts = Vec::new();
            for sibling in element.next_siblings() {
                if let Some(sibling_el) = ElementRef::wrap(sibling) {
                    let name = sibling_el.value().name();
                    if matches!(name, "h1" | "h2" | "h3" | "h4") {
                        break;
                    }
                    let text = element_text(&sibling_el);
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }

            if !parts.is_empty() {
                return Some(parts.join("\n"));
            }
        }

        None
    }

    /// Scans the page text for the first match of a pattern
    fn scan_text(document: &Html, pattern: &Regex) -> Option<String> {
        let body = Selector::parse("body").ok()?;
        let text = document.select(&body).next().map(|b| element_text(&b))?;
        pattern
            .find(&text)
            .map(|m| collapse_whitespace(m.as_str()))
    }

    /// Derives a stable posting id: explicit data attribute, else the last
    /// URL path segment
    fn extract_id(document: &Html, source_url: &str) -> String {
        if let Some(id) = Self::select_attr(document, &["[data-job-id]"], "data-job-id") {
            return id;
        }

        url::Url::parse(source_url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(String::from))
            })
            .unwrap_or_else(|| source_url.to_string())
    }
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for HeuristicExtractor {
    fn extract(&self, content: &str, source_url: &str) -> Posting {
        let document = Html::parse_document(content);

        let title = Self::select_text(&document, TITLE_SELECTORS);
        let company = Self::select_text(&document, COMPANY_SELECTORS);
        let logo = Self::select_attr(&document, LOGO_SELECTORS, "src");
        let location = Self::select_text(&document, LOCATION_SELECTORS);

        let salary = Self::select_text(&document, SALARY_SELECTORS)
            .or_else(|| Self::scan_text(&document, &self.salary_pattern));

        let description = Self::select_text(&document, DESCRIPTION_SELECTORS);
        let requirements = self.section_after_heading(&document, &self.requirements_heading);
        let benefits = self.section_after_heading(&document, &self.benefits_heading);

        let posted_date = Self::select_attr(&document, &["time[datetime]"], "datetime")
            .or_else(|| Self::select_text(&document, POSTED_SELECTORS))
            .or_else(|| Self::scan_text(&document, &self.posted_pattern));

        Posting {
            id: Self::extract_id(&document, source_url),
            title: title.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            company: company.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            logo: logo.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            location: location.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            salary: salary.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            description: description.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            requirements: requirements.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            benefits: benefits.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            source_url: source_url.to_string(),
            posted_date: posted_date.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            scraped_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Joins an element's text nodes with single spaces
///
/// Text nodes from sibling inline elements would otherwise run together.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses runs of whitespace into single spaces and trims
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
