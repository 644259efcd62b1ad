//! Interquartile-range outlier rejection.
//!
//! Quartiles use linear interpolation between order statistics
//! (rank = p * (n - 1)), the same definition numpy's default
//! `percentile` uses. All arithmetic stays in `Decimal` so the worked
//! examples come out exact.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::types::QuoteError;

/// Fence multiplier applied to the IQR on each side.
pub const IQR_FENCE: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Percentiles
// ---------------------------------------------------------------------------

/// Linearly interpolated percentile of an ascending slice.
///
/// `pct` is in `[0, 100]`. Returns `None` for an empty slice.
pub fn percentile(sorted: &[Decimal], pct: Decimal) -> Option<Decimal> {
    let last = sorted.len().checked_sub(1)?;
    let pct = pct.clamp(Decimal::ZERO, dec!(100));

    let rank = pct / dec!(100) * Decimal::from(last);
    let lo = rank.floor();
    let frac = rank - lo;
    let lo_idx = lo.to_usize()?;
    let hi_idx = (lo_idx + 1).min(last);

    let lower = sorted[lo_idx];
    let upper = sorted[hi_idx];
    Some(lower + (upper - lower) * frac)
}

// ---------------------------------------------------------------------------
// Fences
// ---------------------------------------------------------------------------

/// Quartiles and the inclusive acceptance band derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub q1: Decimal,
    pub q3: Decimal,
    pub lower: Decimal,
    pub upper: Decimal,
}

impl Fences {
    /// Compute fences for an unordered price list.
    ///
    /// `NoData` for an empty list, `Aggregation` if a fence falls outside
    /// the `Decimal` range.
    pub fn from_prices(prices: &[Decimal]) -> Result<Self, QuoteError> {
        let mut sorted = prices.to_vec();
        sorted.sort();

        let empty = || QuoteError::NoData("empty price list".to_string());
        let q1 = percentile(&sorted, dec!(25)).ok_or_else(empty)?;
        let q3 = percentile(&sorted, dec!(75)).ok_or_else(empty)?;

        let reach = (q3 - q1)
            .checked_mul(IQR_FENCE)
            .ok_or(QuoteError::Aggregation)?;

        Ok(Self {
            q1,
            q3,
            lower: q1.checked_sub(reach).ok_or(QuoteError::Aggregation)?,
            upper: q3.checked_add(reach).ok_or(QuoteError::Aggregation)?,
        })
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.lower <= price && price <= self.upper
    }
}

// ---------------------------------------------------------------------------
// Trimmed mean
// ---------------------------------------------------------------------------

/// Outcome of IQR trimming followed by an arithmetic mean.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedMean {
    pub mean: Decimal,
    /// Retained prices, in input order.
    pub retained: Vec<Decimal>,
    pub discarded: usize,
    pub fences: Fences,
}

/// Drop prices outside the IQR fences, preserving input order.
pub fn remove_outliers(prices: &[Decimal]) -> Result<(Fences, Vec<Decimal>), QuoteError> {
    let fences = Fences::from_prices(prices)?;
    let retained = prices
        .iter()
        .copied()
        .filter(|p| fences.contains(*p))
        .collect();
    Ok((fences, retained))
}

/// Mean of the prices that survive IQR outlier rejection.
///
/// Fails with `NoData` on empty input and `Aggregation` if nothing
/// survives the fences or the sum overflows.
pub fn trimmed_mean(prices: &[Decimal]) -> Result<TrimmedMean, QuoteError> {
    let (fences, retained) = remove_outliers(prices)?;

    if retained.is_empty() {
        return Err(QuoteError::Aggregation);
    }

    let sum = retained
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or(QuoteError::Aggregation)?;
    let mean = sum / Decimal::from(retained.len());

    Ok(TrimmedMean {
        mean,
        discarded: prices.len() - retained.len(),
        retained,
        fences,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
