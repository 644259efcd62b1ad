//! Mock listing sources for integration testing.
//!
//! Deterministic in-memory `ActiveListingSource` / `SoldListingSource`
//! implementations keyed by query, plus a page renderer that serves
//! canned sold-results HTML. No network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use slabwatch::marketplace::session::PageRenderer;
use slabwatch::marketplace::{ActiveListingSource, SoldListingSource};
use slabwatch::types::Listing;

/// Canned responses per query; unknown queries return an empty list.
#[derive(Default)]
pub struct MockMarket {
    responses: HashMap<String, Vec<Listing>>,
    failures: HashMap<String, String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(mut self, query: &str, listings: &[(&str, Decimal)]) -> Self {
        self.responses.insert(
            query.to_string(),
            listings
                .iter()
                .map(|(title, price)| Listing::new(*title, *price))
                .collect(),
        );
        self
    }

    /// Make `query` fail with `message`.
    pub fn failing(mut self, query: &str, message: &str) -> Self {
        self.failures.insert(query.to_string(), message.to_string());
        self
    }

    /// Shared handle on the queries seen so far.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn respond(&self, query: &str) -> Result<Vec<Listing>> {
        self.calls.lock().unwrap().push(query.to_string());
        if let Some(msg) = self.failures.get(query) {
            return Err(anyhow!("{msg}"));
        }
        Ok(self.responses.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ActiveListingSource for MockMarket {
    async fn search_active(&self, query: &str) -> Result<Vec<Listing>> {
        self.respond(query)
    }
}

#[async_trait]
impl SoldListingSource for MockMarket {
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>> {
        self.respond(query)
    }
}

/// Serves the same HTML for every URL and records whether it was closed.
pub struct CannedRenderer {
    html: String,
    closed: Arc<AtomicBool>,
}

impl CannedRenderer {
    pub fn new(html: String) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                html,
                closed: Arc::clone(&closed),
            },
            closed,
        )
    }
}

#[async_trait]
impl PageRenderer for CannedRenderer {
    async fn render(&self, _url: &str, _wait_for: &str) -> Result<String> {
        Ok(self.html.clone())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A sold-results page in the marketplace's card markup.
pub fn sold_page(cards: &[(&str, &str)]) -> String {
    let items: String = cards
        .iter()
        .map(|(title, price)| {
            format!(
                r#"<li class="s-card"><span class="su-styled-text primary default">{title}</span><span class="su-styled-text positive bold large-1 s-card__price">{price}</span></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}
