//! Marketplace integrations.
//!
//! Defines the listing-source traits the comparison engine depends on and
//! provides eBay implementations for:
//! - OAuth client-credentials token exchange (`token`)
//! - Browse API active-listing search, the buy side (`browse`)
//! - Sold-listings results page scraping, the sell side (`sold`), run
//!   inside a scoped page session (`session`)
//! - Headless Chromium rendering behind the `browser` feature (`browser`)

pub mod browse;
#[cfg(feature = "browser")]
pub mod browser;
pub mod session;
pub mod sold;
pub mod token;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::Listing;

/// Source of listings currently for sale.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActiveListingSource: Send + Sync {
    /// Raw title/price pairs for a free-text query, cheapest first.
    async fn search_active(&self, query: &str) -> Result<Vec<Listing>>;
}

/// Source of recently sold listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SoldListingSource: Send + Sync {
    /// Raw title/price pairs of sold items matching a card name.
    async fn search_sold(&self, query: &str) -> Result<Vec<Listing>>;
}

/// Parse a displayed price such as `"£1,234.56"` or `"£10.00 to £20.00"`.
///
/// Ranges take the lower bound. Currency symbols, mis-decoded symbol
/// bytes and thousands separators are ignored.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let first = text
        .split(" to ")
        .next()
        .unwrap_or(text);
    let cleaned: String = first
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}
