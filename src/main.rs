//! SLABWATCH: ACE 10 to PSA 10 grading arbitrage price tracker
//!
//! Entry point. Loads configuration, initialises structured logging,
//! authenticates against eBay, then runs one of the batch report, the
//! single-card quote or the dashboard server.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use slabwatch::cli::{Command, Invocation};
use slabwatch::config::AppConfig;
use slabwatch::dashboard::{self, DashboardState};
use slabwatch::engine::ComparisonEngine;
use slabwatch::marketplace::browse::EbayBrowseClient;
use slabwatch::marketplace::session::{open_renderer, ScrapeSession};
use slabwatch::marketplace::sold::SoldListingScraper;
use slabwatch::marketplace::token::{EbayTokenProvider, TokenProvider};
use slabwatch::report::{self, OutputFormat};
use slabwatch::storage;
use slabwatch::types::Report;
use slabwatch::watchlist::Watchlist;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let invocation = match Invocation::parse(std::env::args().skip(1)) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let cfg = AppConfig::load(&invocation.config_path)?;

    init_logging();

    info!(
        command = ?invocation.command,
        config = %invocation.config_path,
        marketplace = %cfg.ebay.marketplace_id,
        buy_policy = %cfg.pricing.buy_policy,
        sell_policy = %cfg.pricing.sell_policy,
        "SLABWATCH starting up"
    );

    // -- Authenticate (fatal on failure) ---------------------------------

    let credentials = cfg.credentials()?;
    let provider = EbayTokenProvider::new(&cfg.ebay, credentials)?;
    let token = provider.fetch_token().await?;

    // -- Build the engine; the scrape session lives as long as it does ---

    let active = EbayBrowseClient::new(&cfg.ebay, token)?;
    let session = ScrapeSession::open(open_renderer(&cfg.scraper).await?);
    let sold = SoldListingScraper::new(session, cfg.scraper.clone());
    let engine = ComparisonEngine::new(
        Box::new(active),
        Box::new(sold),
        &cfg.filter,
        cfg.pricing.clone(),
    );

    match invocation.command {
        Command::Quote(card) => {
            let quote = engine.quote_card(&card).await;
            drop(engine);
            match invocation.format {
                OutputFormat::Console => print!("{}", report::render_quote(&quote)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote)?),
            }
        }
        Command::Report => {
            let report = run_batch(&cfg, &engine).await?;
            drop(engine);
            println!("{}", report::render(&report, invocation.format)?);
        }
        Command::Serve => {
            let report = run_batch(&cfg, &engine).await?;
            drop(engine);
            let state = Arc::new(DashboardState::new(report));
            dashboard::serve(state, cfg.dashboard.port).await?;
        }
    }

    Ok(())
}

/// Quote the whole watchlist and write the optional snapshot.
async fn run_batch(cfg: &AppConfig, engine: &ComparisonEngine) -> Result<Report> {
    let watchlist = Watchlist::load(&cfg.watchlist.path)?;
    if watchlist.is_empty() {
        warn!(path = %cfg.watchlist.path, "Watchlist is empty");
    }

    let report = engine.build_report(&watchlist).await;

    if let Some(path) = cfg.report.json_path.as_deref() {
        if let Err(e) = storage::save_report(&report, Some(path)) {
            warn!(path, error = %e, "Failed to write report snapshot");
        } else {
            info!(path, "Report snapshot written");
        }
    }

    Ok(report)
}

/// Initialise the tracing subscriber.
///
/// Uses `RUST_LOG` env var for filtering (default: `slabwatch=info`).
/// Set `SLABWATCH_LOG_JSON=1` for JSON-formatted output.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slabwatch=info"));

    let json_logging = std::env::var("SLABWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
