//! eBay sold-listings page adapter (sell side).
//!
//! URL: `{search_url}?_nkw={query words}+psa+10&_sacat=0&_from=R40&LH_Sold=1&rt=nc&LH_PrefLoc=1`
//! (`LH_Sold=1` restricts to completed sales, `LH_PrefLoc=1` to UK sellers.)
//!
//! Every markup assumption lives in the selector strings of
//! [`ScraperConfig`]; nothing downstream of [`parse_sold_page`] knows
//! about HTML.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::parse_price_text;
use super::session::ScrapeSession;
use super::SoldListingSource;
use crate::config::ScraperConfig;
use crate::types::Listing;

/// Sold-listing source reading rendered result pages through a session.
pub struct SoldListingScraper {
    session: ScrapeSession,
    cfg: ScraperConfig,
}

impl SoldListingScraper {
    pub fn new(session: ScrapeSession, cfg: ScraperConfig) -> Self {
        Self { session, cfg }
    }

    pub fn session(&self) -> &ScrapeSession {
        &self.session
    }
}

#[async_trait]
impl SoldListingSource for SoldListingScraper {
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>> {
        let url = build_sold_url(&self.cfg, query);
        let html = self
            .session
            .render(&url, &self.cfg.card_selector)
            .await
            .with_context(|| format!("Failed to render sold listings for '{query}'"))?;

        let listings = parse_sold_page(&html, &self.cfg)?;
        debug!(query, count = listings.len(), "Parsed sold listings");
        Ok(listings)
    }
}

/// Sold-search URL for `query` plus the configured grade keyword.
pub fn build_sold_url(cfg: &ScraperConfig, query: &str) -> String {
    let keywords = query
        .split_whitespace()
        .chain(cfg.grade_keyword.split_whitespace())
        .map(|w| urlencoding::encode(w).into_owned())
        .collect::<Vec<_>>()
        .join("+");

    format!(
        "{}?_nkw={keywords}&_sacat=0&_from=R40&LH_Sold=1&rt=nc&LH_PrefLoc=1",
        cfg.search_url
    )
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid CSS selector '{css}': {e:?}"))
}

fn first_text(card: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    card.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract (title, price) pairs from the first `max_items` result cards.
///
/// Cards without a title or a parseable price are skipped.
pub fn parse_sold_page(html: &str, cfg: &ScraperConfig) -> Result<Vec<Listing>> {
    let card_sel = selector(&cfg.card_selector)?;
    let price_sel = selector(&cfg.price_selector)?;
    let title_sel = selector(&cfg.title_selector)?;

    let doc = Html::parse_document(html);
    let mut listings = Vec::new();

    for card in doc.select(&card_sel).take(cfg.max_items) {
        let Some(title) = first_text(&card, &title_sel) else {
            continue;
        };
        let Some(price_text) = first_text(&card, &price_sel) else {
            continue;
        };
        match parse_price_text(&price_text) {
            Some(price) => listings.push(Listing::new(title, price)),
            None => debug!(title = %title, price = %price_text, "Unparseable sold price"),
        }
    }

    Ok(listings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
