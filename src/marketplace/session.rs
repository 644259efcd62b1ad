//! Scoped page-rendering session for sold-listing scraping.
//!
//! A [`ScrapeSession`] is opened once per batch and owns its
//! [`PageRenderer`]. Dropping the session closes the renderer, so every
//! exit path (normal completion, `?` early return, panic unwind) releases
//! it without a paired manual `stop()` call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::config::{RendererKind, ScraperConfig};

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Produces the rendered HTML of a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigate to `url` and return the document once `wait_for`
    /// (a CSS selector) is present.
    async fn render(&self, url: &str, wait_for: &str) -> Result<String>;

    /// Release any resources held by the renderer.
    fn close(&mut self);
}

/// Renderer backed by a plain HTTP fetch with browser-like headers.
/// Only valid for server-rendered pages.
pub struct HttpPageRenderer {
    http: Client,
}

impl HttpPageRenderer {
    pub fn new(cfg: &ScraperConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client for page rendering")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn render(&self, url: &str, wait_for: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .header(header::ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
            .send()
            .await
            .with_context(|| format!("Page request failed: {url}"))?;

        if !resp.status().is_success() {
            anyhow::bail!("Page request returned {}: {url}", resp.status());
        }

        let html = resp.text().await.context("Failed to read page body")?;

        if !contains_selector(&html, wait_for)? {
            anyhow::bail!("Selector '{wait_for}' not present on page: {url}");
        }
        Ok(html)
    }

    fn close(&mut self) {}
}

/// Renders through `primary` and retries with `fallback` when it fails,
/// for example when a plain fetch is served a bot-challenge page.
pub struct FallbackRenderer {
    primary: Box<dyn PageRenderer>,
    fallback: Box<dyn PageRenderer>,
}

impl FallbackRenderer {
    pub fn new(primary: Box<dyn PageRenderer>, fallback: Box<dyn PageRenderer>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PageRenderer for FallbackRenderer {
    async fn render(&self, url: &str, wait_for: &str) -> Result<String> {
        match self.primary.render(url, wait_for).await {
            Ok(html) => Ok(html),
            Err(e) => {
                warn!(url, error = %e, "Primary render failed, retrying with fallback");
                self.fallback.render(url, wait_for).await
            }
        }
    }

    fn close(&mut self) {
        self.primary.close();
        self.fallback.close();
    }
}

/// Build the renderer selected by `scraper.renderer`.
pub async fn open_renderer(cfg: &ScraperConfig) -> Result<Box<dyn PageRenderer>> {
    let renderer: Box<dyn PageRenderer> = match cfg.renderer {
        RendererKind::Http => Box::new(HttpPageRenderer::new(cfg)?),
        RendererKind::Browser => launch_browser(cfg).await?,
        RendererKind::HttpThenBrowser => Box::new(FallbackRenderer::new(
            Box::new(HttpPageRenderer::new(cfg)?),
            launch_browser(cfg).await?,
        )),
    };
    Ok(renderer)
}

#[cfg(feature = "browser")]
async fn launch_browser(cfg: &ScraperConfig) -> Result<Box<dyn PageRenderer>> {
    let browser = super::browser::BrowserPageRenderer::launch(cfg).await?;
    Ok(Box::new(browser))
}

#[cfg(not(feature = "browser"))]
async fn launch_browser(_cfg: &ScraperConfig) -> Result<Box<dyn PageRenderer>> {
    anyhow::bail!("Browser rendering requires building with the `browser` feature")
}

/// Whether `selector` matches anything in `html`.
pub fn contains_selector(html: &str, selector: &str) -> Result<bool> {
    let sel = Selector::parse(selector)
        .map_err(|e| anyhow::anyhow!("Invalid CSS selector '{selector}': {e:?}"))?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).next().is_some();
    Ok(found)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One renderer held for the duration of a batch.
pub struct ScrapeSession {
    renderer: Box<dyn PageRenderer>,
    opened_at: DateTime<Utc>,
    pages: AtomicU64,
}

impl ScrapeSession {
    pub fn open(renderer: Box<dyn PageRenderer>) -> Self {
        info!("Scrape session opened");
        Self {
            renderer,
            opened_at: Utc::now(),
            pages: AtomicU64::new(0),
        }
    }

    pub async fn render(&self, url: &str, wait_for: &str) -> Result<String> {
        self.pages.fetch_add(1, Ordering::Relaxed);
        debug!(url, "Rendering page");
        self.renderer.render(url, wait_for).await
    }

    pub fn pages_rendered(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }
}

impl Drop for ScrapeSession {
    fn drop(&mut self) {
        self.renderer.close();
        let held_secs = (Utc::now() - self.opened_at).num_seconds();
        info!(
            pages = self.pages_rendered(),
            held_secs,
            "Scrape session released"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
