//! Core engine: watchlist card → buy/sell quotes → comparison report.

pub mod comparison;

pub use comparison::{buy_query, sell_query, ComparisonEngine};
