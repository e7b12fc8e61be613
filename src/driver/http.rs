//! Plain-HTTP session binding
//!
//! For fully server-rendered sites no browser is needed: a session is an
//! HTTP client plus the markup of the last fetched page. Selector queries
//! run against that snapshot, so element handles are immutable captures of
//! attributes and text. Clicking is not supported; navigation happens by
//! URL.

use crate::driver::{DriverError, DriverResult, PageElement, PageSession, SessionFactory};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Builds the HTTP client used by all HTTP sessions
fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("gleaner/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Factory for HTTP-backed sessions
pub struct HttpFactory {
    client: Client,
}

impl HttpFactory {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl SessionFactory for HttpFactory {
    async fn new_session(&self) -> DriverResult<Box<dyn PageSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            page: Mutex::new(None),
        }))
    }
}

/// Markup snapshot of the most recently opened page
struct FetchedPage {
    url: String,
    body: String,
}

/// One HTTP session: a client handle plus the last fetched page
pub struct HttpSession {
    client: Client,
    page: Mutex<Option<FetchedPage>>,
}

#[async_trait]
impl PageSession for HttpSession {
    async fn open(&self, url: &str) -> DriverResult<()> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| DriverError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        *self.page.lock().unwrap() = Some(FetchedPage {
            url: url.to_string(),
            body,
        });

        Ok(())
    }

    async fn wait_until_stable(&self) -> DriverResult<()> {
        // Server-rendered markup is final as soon as the body arrives
        Ok(())
    }

    async fn content(&self) -> DriverResult<String> {
        let page = self.page.lock().unwrap();
        page.as_ref()
            .map(|p| p.body.clone())
            .ok_or_else(|| DriverError::Session("no page opened yet".to_string()))
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        let parsed = Selector::parse(selector).map_err(|e| DriverError::Query {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;

        let page = self.page.lock().unwrap();
        let Some(page) = page.as_ref() else {
            return Err(DriverError::Session("no page opened yet".to_string()));
        };

        let document = Html::parse_document(&page.body);
        let elements = document
            .select(&parsed)
            .map(|element| {
                let attributes: HashMap<String, String> = element
                    .value()
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect();
                let text = element
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ");

                Box::new(SnapshotElement { attributes, text }) as Box<dyn PageElement>
            })
            .collect();

        tracing::trace!("Query '{}' on {} matched", selector, page.url);
        Ok(elements)
    }

    async fn close(&self) -> DriverResult<()> {
        *self.page.lock().unwrap() = None;
        Ok(())
    }
}

/// Immutable capture of one matched element
struct SnapshotElement {
    attributes: HashMap<String, String>,
    text: String,
}

#[async_trait]
impl PageElement for SnapshotElement {
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.attributes.get(name).cloned())
    }

    async fn text(&self) -> DriverResult<String> {
        Ok(self.text.clone())
    }

    async fn click(&self) -> DriverResult<()> {
        Err(DriverError::Unsupported("click on a static HTTP snapshot"))
    }
}
