//! Chrome DevTools Protocol session binding
//!
//! Connects to a running browser's debug endpoint and opens one page per
//! session. The browser-side event stream is drained on a background task
//! for the lifetime of the session.

use crate::driver::{DriverError, DriverResult, PageElement, PageSession, SessionFactory};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long to let the renderer settle after navigation reports done
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Factory for CDP-backed sessions
pub struct CdpFactory {
    endpoint: String,
}

impl CdpFactory {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SessionFactory for CdpFactory {
    async fn new_session(&self) -> DriverResult<Box<dyn PageSession>> {
        let (browser, mut handler) =
            Browser::connect(&self.endpoint)
                .await
                .map_err(|e| DriverError::Connect {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                })?;

        // Drain browser events until the connection drops
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Box::new(CdpSession {
            _browser: browser,
            page,
            handler_task,
        }))
    }
}

/// One CDP session: a dedicated page on a private browser connection
pub struct CdpSession {
    /// Held so the connection outlives the page
    _browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl PageSession for CdpSession {
    async fn open(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_until_stable(&self) -> DriverResult<()> {
        self.page.wait_for_navigation().await?;
        // Dynamic listings keep painting briefly after the load event
        tokio::time::sleep(SETTLE_DELAY).await;
        Ok(())
    }

    async fn content(&self) -> DriverResult<String> {
        Ok(self.page.content().await?)
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Box<dyn PageElement>>> {
        let elements =
            self.page
                .find_elements(selector)
                .await
                .map_err(|e| DriverError::Query {
                    selector: selector.to_string(),
                    message: e.to_string(),
                })?;

        Ok(elements
            .into_iter()
            .map(|e| Box::new(CdpElement { inner: e }) as Box<dyn PageElement>)
            .collect())
    }

    async fn close(&self) -> DriverResult<()> {
        // Closing the page disconnects our tab only; the browser we attached
        // to keeps running.
        self.page.clone().close().await?;
        self.handler_task.abort();
        Ok(())
    }
}

struct CdpElement {
    inner: Element,
}

#[async_trait]
impl PageElement for CdpElement {
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn text(&self) -> DriverResult<String> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    async fn click(&self) -> DriverResult<()> {
        self.inner.click().await?;
        Ok(())
    }
}
