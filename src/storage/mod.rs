//! Report snapshot persistence.
//!
//! Writes the most recent comparison report to a JSON file. The file
//! layout is exactly the JSON report format served by the dashboard.

use anyhow::{Context, Result};
use tracing::debug;

use crate::types::Report;

/// Default snapshot path.
pub const DEFAULT_REPORT_FILE: &str = "slabwatch_report.json";

/// Save a report as pretty-printed JSON.
pub fn save_report(report: &Report, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_REPORT_FILE);
    let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;

    std::fs::write(path, &json).context(format!("Failed to write report to {path}"))?;

    debug!(path, cards = report.total_cards, "Report saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
