//! Buy/sell comparison across the watchlist.
//!
//! For each card: fetch active listings for `"<card> ACE 10"`, filter and
//! aggregate them into a buy price; fetch sold listings for `"<card>"`,
//! filter and aggregate them into a sell price; combine into a
//! [`CardQuote`]. A failure on either side only blanks that side of that
//! card. Cards are resolved strictly one after another.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{FilterConfig, PricingConfig};
use crate::filter::{TitleContext, TitleFilter};
use crate::marketplace::{ActiveListingSource, SoldListingSource};
use crate::pricing::{aggregate, Aggregate, AggregationPolicy};
use crate::types::{CardQuote, Grade, Listing, PriceSample, QuoteError, Report};
use crate::watchlist::Watchlist;

/// Query sent to the active-listing search for a card.
pub fn buy_query(card_name: &str) -> String {
    format!("{} {}", card_name.trim(), Grade::Ace10.label())
}

/// Query sent to the sold-listing search for a card.
pub fn sell_query(card_name: &str) -> String {
    card_name.trim().to_string()
}

pub struct ComparisonEngine {
    active: Box<dyn ActiveListingSource>,
    sold: Box<dyn SoldListingSource>,
    active_filter: TitleFilter,
    sold_filter: TitleFilter,
    pricing: PricingConfig,
}

impl ComparisonEngine {
    pub fn new(
        active: Box<dyn ActiveListingSource>,
        sold: Box<dyn SoldListingSource>,
        filter: &FilterConfig,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            active,
            sold,
            active_filter: TitleFilter::for_active(filter),
            sold_filter: TitleFilter::for_sold(filter),
            pricing,
        }
    }

    /// Representative ACE 10 asking price for `card_name`.
    pub async fn buy_quote(&self, card_name: &str) -> Result<Aggregate, QuoteError> {
        let query = buy_query(card_name);
        let listings = self
            .active
            .search_active(&query)
            .await
            .map_err(|e| QuoteError::fetch(&query, format!("{e:#}")))?;

        let ctx = TitleContext::new(query.as_str(), Grade::Ace10);
        self.price_side(&self.active_filter, self.pricing.buy_policy, listings, &ctx)
    }

    /// Representative PSA 10 sold price for `card_name`.
    pub async fn sell_quote(&self, card_name: &str) -> Result<Aggregate, QuoteError> {
        let query = sell_query(card_name);
        let listings = self
            .sold
            .search_sold(&query)
            .await
            .map_err(|e| QuoteError::fetch(&query, format!("{e:#}")))?;

        let ctx = TitleContext::new(query.as_str(), Grade::Psa10).with_card_number_from(&query);
        self.price_side(&self.sold_filter, self.pricing.sell_policy, listings, &ctx)
    }

    fn price_side(
        &self,
        filter: &TitleFilter,
        policy: AggregationPolicy,
        listings: Vec<Listing>,
        ctx: &TitleContext,
    ) -> Result<Aggregate, QuoteError> {
        let fetched = listings.len();
        let outcome = filter.apply(listings, ctx);

        debug!(
            query = %ctx.query,
            grade = %ctx.grade,
            fetched,
            kept = outcome.kept.len(),
            rejected = ?outcome.rejected,
            "Title filter applied"
        );

        let samples: Vec<PriceSample> = outcome.kept.into_iter().map(PriceSample::from).collect();
        aggregate(policy, samples, &ctx.query)
    }

    /// Both sides for one card. Never fails; missing sides are `None`.
    pub async fn quote_card(&self, card_name: &str) -> CardQuote {
        let buy = match self.buy_quote(card_name).await {
            Ok(agg) => Some(agg.price),
            Err(e) => {
                warn!(card = %card_name, side = %Grade::Ace10, error = %e, "Buy quote unavailable");
                None
            }
        };

        let sell = match self.sell_quote(card_name).await {
            Ok(agg) => {
                debug!(card = %card_name, used = agg.used.len(), "Sell samples retained");
                Some(agg.price)
            }
            Err(e) => {
                warn!(card = %card_name, side = %Grade::Psa10, error = %e, "Sell quote unavailable");
                None
            }
        };

        let quote = CardQuote::new(card_name.trim(), buy, sell);
        info!(
            card = %quote.card_name,
            buy = ?quote.buy_price,
            sell = ?quote.sell_price,
            profit = ?quote.profit,
            "Card quoted"
        );
        quote
    }

    /// Quote every watchlist card in order.
    pub async fn build_report(&self, watchlist: &Watchlist) -> Report {
        info!(cards = watchlist.len(), "Building comparison report");

        let mut quotes = Vec::with_capacity(watchlist.len());
        for card in watchlist.iter() {
            quotes.push(self.quote_card(card).await);
        }

        let report = Report::new(Utc::now(), quotes);
        info!(
            total = report.total_cards,
            complete = report.complete_count(),
            "Comparison report built"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
