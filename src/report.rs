//! Console and JSON rendering of quotes and reports.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::fmt::Write;

use crate::types::{CardQuote, Grade, Report, CURRENCY_SYMBOL, PRICE_DECIMALS};

const NO_RESULTS: &str = "No results found";

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "console" | "text" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            other => anyhow::bail!("Unknown output format '{other}' (expected console or json)"),
        }
    }
}

/// `£12.34`
pub fn format_price(value: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{:.*}", PRICE_DECIMALS as usize, value)
}

fn side_line(grade: Grade, price: Option<Decimal>) -> String {
    match price {
        Some(p) => format!("{grade}: {}", format_price(p)),
        None => format!("{grade}: {NO_RESULTS}"),
    }
}

/// Console block for one card; the profit line only appears when defined.
pub fn render_quote(quote: &CardQuote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Average listing price for {}", quote.card_name);
    let _ = writeln!(out, "{}", side_line(Grade::Ace10, quote.buy_price));
    let _ = writeln!(out, "{}", side_line(Grade::Psa10, quote.sell_price));
    if let Some(profit) = quote.profit {
        let _ = writeln!(out, "Potential Profit: {}", format_price(profit));
    }
    out
}

/// Every card block, separated by blank lines.
pub fn render_console(report: &Report) -> String {
    report
        .quotes
        .iter()
        .map(render_quote)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialise report")
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(render_console(report)),
        OutputFormat::Json => render_json(report),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
