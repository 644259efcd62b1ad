//! Headless Chromium page renderer.
//!
//! Loads the page in a real browser and polls until the wait-for
//! selector appears, so script-rendered results and bot challenges that
//! resolve in-browser still produce the results markup.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::PageRenderer;
use crate::config::ScraperConfig;

const SELECTOR_POLL: Duration = Duration::from_millis(250);

pub struct BrowserPageRenderer {
    browser: Option<Browser>,
    events: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl BrowserPageRenderer {
    pub async fn launch(cfg: &ScraperConfig) -> Result<Self> {
        let config = BrowserConfig::builder()
            .arg(format!("--user-agent={}", cfg.user_agent))
            .build()
            .map_err(|e| anyhow!("Invalid browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch headless browser")?;

        // The CDP connection only makes progress while its handler is polled.
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "Browser event loop stopped");
                    break;
                }
            }
        });

        info!("Headless browser launched");
        Ok(Self {
            browser: Some(browser),
            events: Some(events),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }
}

#[async_trait]
impl PageRenderer for BrowserPageRenderer {
    async fn render(&self, url: &str, wait_for: &str) -> Result<String> {
        let browser = self.browser.as_ref().context("Browser already closed")?;
        let page = browser
            .new_page(url)
            .await
            .with_context(|| format!("Navigation failed: {url}"))?;

        let appeared = tokio::time::timeout(self.timeout, async {
            while page.find_element(wait_for).await.is_err() {
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        })
        .await;

        let html = match appeared {
            Ok(()) => page.content().await.context("Failed to read rendered page"),
            Err(_) => Err(anyhow!(
                "Selector '{wait_for}' not present after {}s: {url}",
                self.timeout.as_secs()
            )),
        };

        if let Err(e) = page.close().await {
            debug!(url, error = %e, "Page close failed");
        }
        html
    }

    fn close(&mut self) {
        // Dropping the browser kills the Chromium child process.
        drop(self.browser.take());
        if let Some(events) = self.events.take() {
            events.abort();
        }
    }
}
