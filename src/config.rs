//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Marketplace credentials are referenced by env-var name in the config
//! and resolved at runtime into an [`EbayCredentials`] value that is
//! passed explicitly to the token provider.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::fs;

use crate::pricing::AggregationPolicy;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ebay: EbayConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Browse API + OAuth settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EbayConfig {
    pub client_id_env: String,
    pub client_secret_env: String,
    pub token_url: String,
    pub scope: String,
    pub browse_url: String,
    pub marketplace_id: String,
    /// Results requested per active search.
    pub search_limit: u32,
    pub sort: String,
    pub timeout_secs: u64,
}

impl Default for EbayConfig {
    fn default() -> Self {
        Self {
            client_id_env: "EBAY_CLIENT_ID".into(),
            client_secret_env: "EBAY_CLIENT_SECRET".into(),
            token_url: "https://api.ebay.com/identity/v1/oauth2/token".into(),
            scope: "https://api.ebay.com/oauth/api_scope".into(),
            browse_url: "https://api.ebay.com/buy/browse/v1/item_summary/search".into(),
            marketplace_id: "EBAY_GB".into(),
            search_limit: 10,
            sort: "price".into(),
            timeout_secs: 30,
        }
    }
}

/// Sold-listings page adapter. Selector strings are the only thing that
/// should need touching when the page markup changes.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScraperConfig {
    pub search_url: String,
    /// Appended to the query words in `_nkw`.
    pub grade_keyword: String,
    pub card_selector: String,
    pub price_selector: String,
    pub title_selector: String,
    /// Only the first N result cards are read.
    pub max_items: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub renderer: RendererKind,
}

/// How sold-results pages are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Plain HTTP fetch.
    Http,
    /// Headless Chromium; needs the `browser` feature.
    Browser,
    /// HTTP first, headless Chromium when the page lacks the results.
    HttpThenBrowser,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.ebay.co.uk/sch/i.html".into(),
            grade_keyword: "psa 10".into(),
            card_selector: "li.s-card".into(),
            price_selector: "span.su-styled-text.positive.bold.large-1.s-card__price".into(),
            title_selector: "span.su-styled-text.primary.default".into(),
            max_items: 10,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
            timeout_secs: 30,
            renderer: RendererKind::Http,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    pub denylist: Vec<String>,
    pub language_markers: Vec<String>,
    /// Require "ACE 10" in active listing titles.
    pub confirm_buy_grade: bool,
    /// Require the query's card number in sold listing titles.
    pub confirm_card_number: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            denylist: [
                "contender",
                "likely",
                "candidate",
                "possible",
                "looks",
                "would grade",
                "raw",
                "psa 9",
                "psa9",
                "equivalent",
                "9.5",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            language_markers: vec!["JPN".into(), "Japanese".into()],
            confirm_buy_grade: true,
            confirm_card_number: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PricingConfig {
    pub buy_policy: AggregationPolicy,
    pub sell_policy: AggregationPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            buy_policy: AggregationPolicy::FirstMatch,
            sell_policy: AggregationPolicy::TrimmedMean,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WatchlistConfig {
    pub path: String,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: "top_chase.txt".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReportConfig {
    /// Write the JSON report here after a batch run.
    pub json_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// OAuth client credentials. The secret never appears in `Debug` output.
pub struct EbayCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl EbayCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    pub fn secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl fmt::Debug for EbayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EbayCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve marketplace credentials from the env vars named in `[ebay]`.
    pub fn credentials(&self) -> Result<EbayCredentials> {
        let client_id = Self::resolve_env(&self.ebay.client_id_env)?;
        let client_secret = Self::resolve_env(&self.ebay.client_secret_env)?;
        Ok(EbayCredentials::new(client_id, client_secret))
    }
}
