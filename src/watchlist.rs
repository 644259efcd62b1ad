//! Watchlist of card names, one per line.

use anyhow::{Context, Result};
use std::fs;
use tracing::info;

/// Ordered card names, immutable for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    cards: Vec<String>,
}

impl Watchlist {
    /// Trimmed non-blank lines, in file order.
    pub fn parse(contents: &str) -> Self {
        let cards = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { cards }
    }

    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read watchlist: {path}"))?;
        let watchlist = Self::parse(&contents);
        info!(path, cards = watchlist.len(), "Watchlist loaded");
        Ok(watchlist)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
