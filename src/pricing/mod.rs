//! Price aggregation.
//!
//! Turns the filtered listings for one query into a single representative
//! price. Two policies exist: the buy side takes the cheapest surviving
//! listing, the sell side takes an IQR-trimmed mean of sold prices.

pub mod iqr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{PriceSample, QuoteError};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How a list of prices collapses to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Price of the single lowest-priced listing.
    FirstMatch,
    /// Mean after interquartile-range outlier rejection.
    TrimmedMean,
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationPolicy::FirstMatch => write!(f, "first_match"),
            AggregationPolicy::TrimmedMean => write!(f, "trimmed_mean"),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Representative price plus the samples that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub price: Decimal,
    pub used: Vec<PriceSample>,
    pub policy: AggregationPolicy,
}

/// Aggregate samples for `query` under `policy`.
///
/// Non-positive prices are dropped first. An empty remainder is `NoData`;
/// an empty set after outlier removal is `Aggregation`.
pub fn aggregate(
    policy: AggregationPolicy,
    samples: Vec<PriceSample>,
    query: &str,
) -> Result<Aggregate, QuoteError> {
    let total = samples.len();
    let samples: Vec<PriceSample> = samples
        .into_iter()
        .filter(|s| s.price > Decimal::ZERO)
        .collect();

    if samples.len() < total {
        debug!(query, dropped = total - samples.len(), "Dropped non-positive prices");
    }

    if samples.is_empty() {
        return Err(QuoteError::NoData(query.to_string()));
    }

    match policy {
        AggregationPolicy::FirstMatch => first_match(samples),
        AggregationPolicy::TrimmedMean => trimmed(samples, query),
    }
}

/// Cheapest sample; ties keep the earliest.
fn first_match(samples: Vec<PriceSample>) -> Result<Aggregate, QuoteError> {
    let mut cheapest: Option<PriceSample> = None;
    for sample in samples {
        match &cheapest {
            Some(best) if best.price <= sample.price => {}
            _ => cheapest = Some(sample),
        }
    }

    let best = cheapest.ok_or(QuoteError::Aggregation)?;
    Ok(Aggregate {
        price: best.price,
        used: vec![best],
        policy: AggregationPolicy::FirstMatch,
    })
}

fn trimmed(samples: Vec<PriceSample>, query: &str) -> Result<Aggregate, QuoteError> {
    let prices: Vec<Decimal> = samples.iter().map(|s| s.price).collect();
    let result = iqr::trimmed_mean(&prices)?;

    debug!(
        query,
        q1 = %result.fences.q1,
        q3 = %result.fences.q3,
        lower = %result.fences.lower,
        upper = %result.fences.upper,
        discarded = result.discarded,
        "IQR outlier rejection"
    );

    let used = samples
        .into_iter()
        .filter(|s| result.fences.contains(s.price))
        .collect();

    Ok(Aggregate {
        price: result.mean,
        used,
        policy: AggregationPolicy::TrimmedMean,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
