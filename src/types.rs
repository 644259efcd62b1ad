//! Shared types for SLABWATCH.
//!
//! These types form the data model used across all modules: raw
//! listings coming out of the marketplace adapters, the price samples
//! the aggregator consumes, and the per-card quotes and report that
//! leave the system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All prices are implied GBP.
pub const CURRENCY_SYMBOL: &str = "£";

/// Prices and profit are rounded to pence.
pub const PRICE_DECIMALS: u32 = 2;

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

/// Grading service + score being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// ACE 10: the buy side, graded cards listed for sale right now.
    Ace10,
    /// PSA 10: the sell side, realised sold prices.
    Psa10,
}

impl Grade {
    /// Grading company name as it appears in titles.
    pub fn service(&self) -> &'static str {
        match self {
            Grade::Ace10 => "ACE",
            Grade::Psa10 => "PSA",
        }
    }

    pub fn score(&self) -> u8 {
        10
    }

    /// Human label, also the JSON key used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Ace10 => "ACE 10",
            Grade::Psa10 => "PSA 10",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// A single marketplace result: free-text title plus asking/sold price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub price: Decimal,
}

impl Listing {
    pub fn new(title: impl Into<String>, price: Decimal) -> Self {
        Self {
            title: title.into(),
            price,
        }
    }
}

/// A price kept for aggregation, with the title it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub price: Decimal,
    pub title: String,
}

impl From<Listing> for PriceSample {
    fn from(listing: Listing) -> Self {
        Self {
            price: listing.price,
            title: listing.title,
        }
    }
}

// ---------------------------------------------------------------------------
// Quotes & reports
// ---------------------------------------------------------------------------

/// Buy/sell comparison for one watchlist card.
///
/// `profit` is only ever `Some` when both sides are present and non-zero.
/// Construct through [`CardQuote::new`] so the invariant holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardQuote {
    pub card_name: String,
    #[serde(rename = "ACE 10")]
    pub buy_price: Option<Decimal>,
    #[serde(rename = "PSA 10")]
    pub sell_price: Option<Decimal>,
    #[serde(rename = "Potential Profit")]
    pub profit: Option<Decimal>,
}

impl CardQuote {
    pub fn new(
        card_name: impl Into<String>,
        buy_price: Option<Decimal>,
        sell_price: Option<Decimal>,
    ) -> Self {
        let buy_price = buy_price.map(round_price);
        let sell_price = sell_price.map(round_price);
        let profit = match (buy_price, sell_price) {
            (Some(buy), Some(sell)) if !buy.is_zero() && !sell.is_zero() => {
                Some(round_price(sell - buy))
            }
            _ => None,
        };
        Self {
            card_name: card_name.into(),
            buy_price,
            sell_price,
            profit,
        }
    }

    /// A quote with neither side priced.
    pub fn empty(card_name: impl Into<String>) -> Self {
        Self::new(card_name, None, None)
    }

    pub fn is_complete(&self) -> bool {
        self.profit.is_some()
    }
}

/// Result of one batch run over the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_cards: usize,
    #[serde(rename = "last_updated", with = "report_timestamp")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "cards")]
    pub quotes: Vec<CardQuote>,
}

impl Report {
    pub fn new(generated_at: DateTime<Utc>, quotes: Vec<CardQuote>) -> Self {
        Self {
            total_cards: quotes.len(),
            generated_at,
            quotes,
        }
    }

    /// Case-insensitive lookup by card name.
    pub fn find(&self, card_name: &str) -> Option<&CardQuote> {
        let wanted = card_name.trim().to_lowercase();
        self.quotes
            .iter()
            .find(|q| q.card_name.to_lowercase() == wanted)
    }

    /// Number of cards with both sides priced.
    pub fn complete_count(&self) -> usize {
        self.quotes.iter().filter(|q| q.is_complete()).count()
    }
}

/// `last_updated` is rendered as local-style `YYYY-MM-DD HH:MM:SS` (UTC).
mod report_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Round to pence, half away from zero.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        PRICE_DECIMALS,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure kinds for producing a quote.
///
/// Only `Auth` is fatal for a run; the others are recovered per card and
/// surface as an absent price.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Fetch failed for '{query}': {message}")]
    Fetch { query: String, message: String },

    #[error("No usable listings for '{0}'")]
    NoData(String),

    #[error("Insufficient data: outlier removal left no prices")]
    Aggregation,
}

impl QuoteError {
    pub fn fetch(query: &str, err: impl fmt::Display) -> Self {
        QuoteError::Fetch {
            query: query.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, QuoteError::Auth(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
