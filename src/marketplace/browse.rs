//! eBay Browse API active-listing search (buy side).
//!
//! Endpoint: `GET {browse_url}?q=..&limit=..&sort=price`
//! Headers: `Authorization: Bearer {token}`, `X-EBAY-C-MARKETPLACE-ID`.
//! Response: `{ "itemSummaries": [ { "title": .., "price": { "value": "12.34", "currency": "GBP" } } ] }`.
//! A missing `itemSummaries` array means zero results, not an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

use super::token::AccessToken;
use super::ActiveListingSource;
use crate::config::EbayConfig;
use crate::types::Listing;

const MARKETPLACE_HEADER: &str = "X-EBAY-C-MARKETPLACE-ID";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ItemSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<Amount>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    value: String,
    #[serde(default)]
    currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Browse API client bound to one bearer token for the run.
pub struct EbayBrowseClient {
    http: Client,
    token: AccessToken,
    browse_url: String,
    marketplace_id: String,
    limit: u32,
    sort: String,
}

impl EbayBrowseClient {
    pub fn new(cfg: &EbayConfig, token: AccessToken) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("slabwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for eBay Browse API")?;

        Ok(Self {
            http,
            token,
            browse_url: cfg.browse_url.clone(),
            marketplace_id: cfg.marketplace_id.clone(),
            limit: cfg.search_limit,
            sort: cfg.sort.clone(),
        })
    }
}

#[async_trait]
impl ActiveListingSource for EbayBrowseClient {
    async fn search_active(&self, query: &str) -> Result<Vec<Listing>> {
        debug!(query, limit = self.limit, "Searching eBay active listings");

        let limit = self.limit.to_string();
        let resp = self
            .http
            .get(&self.browse_url)
            .bearer_auth(self.token.bearer())
            .header(MARKETPLACE_HEADER, &self.marketplace_id)
            .query(&[("q", query), ("limit", limit.as_str()), ("sort", self.sort.as_str())])
            .send()
            .await
            .context("eBay Browse API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("eBay Browse API error {status}: {body}");
        }

        let body = resp
            .text()
            .await
            .context("Failed to read eBay Browse API response")?;

        parse_search_response(&body)
    }
}

/// Convert a Browse search body into listings, in response order.
///
/// Items missing a title or a parseable price are skipped.
pub fn parse_search_response(body: &str) -> Result<Vec<Listing>> {
    let parsed: SearchResponse =
        serde_json::from_str(body).context("Failed to parse eBay Browse search response")?;

    let mut listings = Vec::with_capacity(parsed.item_summaries.len());
    for item in parsed.item_summaries {
        let (Some(title), Some(price)) = (item.title, item.price) else {
            continue;
        };
        match Decimal::from_str(price.value.trim()) {
            Ok(value) => {
                if let Some(currency) = price.currency.as_deref() {
                    if currency != "GBP" {
                        debug!(title = %title, currency, "Non-GBP listing price");
                    }
                }
                listings.push(Listing::new(title, value));
            }
            Err(e) => warn!(title = %title, value = %price.value, error = %e, "Unparseable listing price"),
        }
    }

    debug!(total = ?parsed.total, returned = listings.len(), "Parsed active listings");
    Ok(listings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
