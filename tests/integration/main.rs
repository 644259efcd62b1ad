//! End-to-end tests: watchlist → mock marketplace → report → outputs.

mod mock_sources;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

use mock_sources::{sold_page, CannedRenderer, MockMarket};
use slabwatch::config::{AppConfig, FilterConfig, PricingConfig, ScraperConfig};
use slabwatch::dashboard::{build_router, DashboardState};
use slabwatch::engine::ComparisonEngine;
use slabwatch::marketplace::session::ScrapeSession;
use slabwatch::marketplace::sold::SoldListingScraper;
use slabwatch::pricing::AggregationPolicy;
use slabwatch::report::{render_console, render_json};
use slabwatch::storage;
use slabwatch::types::Report;
use slabwatch::watchlist::Watchlist;

fn active_market() -> MockMarket {
    MockMarket::new()
        .with_listings(
            "Pikachu 25 ACE 10",
            &[
                ("Pikachu ACE 10 #25", dec!(50)),
                ("Pikachu raw #25", dec!(10)),
                ("Pikachu ACE 10 likely #25", dec!(5)),
            ],
        )
        .with_listings(
            "Mew ex 151 ACE 10",
            &[("Mew ex 151/165 ACE 10 Gem Mint", dec!(38.99))],
        )
}

fn sold_market() -> MockMarket {
    MockMarket::new()
        .with_listings(
            "Pikachu 25",
            &[
                ("Pikachu #25 PSA 10", dec!(10)),
                ("Pikachu 25/102 PSA 10", dec!(12)),
                ("Pikachu 25 PSA 10 Gem", dec!(11)),
                ("Pikachu 25 PSA-10", dec!(13)),
                ("Pikachu 25 PSA 10 sealed lot", dec!(100)),
                ("Pikachu 250 PSA 10", dec!(400)),
                ("Pikachu 25 JPN PSA 10", dec!(80)),
            ],
        )
        .failing("Mew ex 151", "navigation timeout")
}

fn engine(active: MockMarket, sold: MockMarket) -> ComparisonEngine {
    ComparisonEngine::new(
        Box::new(active),
        Box::new(sold),
        &FilterConfig::default(),
        PricingConfig::default(),
    )
}

#[tokio::test]
async fn test_batch_report_end_to_end() {
    let active = active_market();
    let active_calls = active.calls();
    let engine = engine(active, sold_market());
    let watchlist = Watchlist::parse("Pikachu 25\n\nMew ex 151\n  Gengar 94  \n");

    let report = engine.build_report(&watchlist).await;

    assert_eq!(report.total_cards, 3);
    assert_eq!(
        *active_calls.lock().unwrap(),
        vec!["Pikachu 25 ACE 10", "Mew ex 151 ACE 10", "Gengar 94 ACE 10"]
    );

    let pikachu = report.find("pikachu 25").unwrap();
    assert_eq!(pikachu.buy_price, Some(dec!(50)));
    assert_eq!(pikachu.sell_price, Some(dec!(11.5)));
    assert_eq!(pikachu.profit, Some(dec!(-38.5)));

    let mew = report.find("Mew ex 151").unwrap();
    assert_eq!(mew.buy_price, Some(dec!(38.99)));
    assert_eq!(mew.sell_price, None);
    assert_eq!(mew.profit, None);

    let gengar = report.find("Gengar 94").unwrap();
    assert!(gengar.buy_price.is_none() && gengar.sell_price.is_none());
    assert_eq!(report.complete_count(), 1);

    let text = render_console(&report);
    assert!(text.contains("Average listing price for Pikachu 25\nACE 10: £50.00\nPSA 10: £11.50\nPotential Profit: £-38.50\n"));
    assert!(text.contains("Average listing price for Mew ex 151\nACE 10: £38.99\nPSA 10: No results found\n"));
    assert!(text.contains("Average listing price for Gengar 94\nACE 10: No results found\nPSA 10: No results found\n"));

    let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
    assert_eq!(json["total_cards"], 3);
    assert!(json["cards"][1]["PSA 10"].is_null());
    assert!(json["cards"][2]["Potential Profit"].is_null());
}

#[tokio::test]
async fn test_empty_watchlist() {
    let engine = engine(MockMarket::new(), MockMarket::new());
    let report = engine.build_report(&Watchlist::parse("")).await;

    assert_eq!(report.total_cards, 0);
    let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
    assert_eq!(json["cards"], serde_json::json!([]));
}

#[tokio::test]
async fn test_snapshot_then_dashboard() {
    let engine = engine(active_market(), sold_market());
    let report = engine
        .build_report(&Watchlist::parse("Pikachu 25\nMew ex 151"))
        .await;

    let mut path = std::env::temp_dir();
    path.push(format!("slabwatch_it_report_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();
    storage::save_report(&report, Some(&path)).unwrap();
    let restored: Report =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.quotes, report.quotes);

    let app = build_router(Arc::new(DashboardState::new(restored)));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/cards/PIKACHU%2025")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let card: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(card["ACE 10"].as_f64(), Some(50.0));
    assert_eq!(card["PSA 10"].as_f64(), Some(11.5));
}

#[tokio::test]
async fn test_scraped_sold_side_and_session_release() {
    let html = sold_page(&[
        ("Umbreon VMAX 215/203 PSA 10", "£600.00"),
        ("Umbreon VMAX #215 PSA 10 Gem Mint", "£640.00"),
        ("Umbreon VMAX 215 PSA 9", "£300.00"),
        ("Umbreon VMAX 215 PSA 10 Japanese", "£200.00"),
        ("Umbreon VMAX 215 PSA 10", "£620.00 to £700.00"),
    ]);
    let (renderer, closed) = CannedRenderer::new(html);
    let sold = SoldListingScraper::new(
        ScrapeSession::open(Box::new(renderer)),
        ScraperConfig::default(),
    );

    let active = MockMarket::new().with_listings(
        "Umbreon VMAX 215 ACE 10",
        &[
            ("Umbreon VMAX ACE 10 215/203", dec!(450.00)),
            ("Umbreon VMAX ACE 10 215/203", dec!(480.00)),
        ],
    );

    let engine = ComparisonEngine::new(
        Box::new(active),
        Box::new(sold),
        &FilterConfig::default(),
        PricingConfig::default(),
    );

    let quote = engine.quote_card("Umbreon VMAX 215").await;
    assert_eq!(quote.buy_price, Some(dec!(450.00)));
    assert_eq!(quote.sell_price, Some(dec!(620.00)));
    assert_eq!(quote.profit, Some(dec!(170.00)));

    assert!(!closed.load(Ordering::SeqCst));
    drop(engine);
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_configured_policies_and_denylist() {
    let cfg = AppConfig::parse(
        r#"
        [filter]
        denylist = ["raw", "sealed"]

        [pricing]
        buy_policy = "first_match"
        sell_policy = "first_match"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.pricing.sell_policy, AggregationPolicy::FirstMatch);

    let engine = ComparisonEngine::new(
        Box::new(active_market()),
        Box::new(sold_market()),
        &cfg.filter,
        cfg.pricing.clone(),
    );

    let quote = engine.quote_card("Pikachu 25").await;
    // "likely" is no longer denied, so the £5 listing wins the buy side.
    assert_eq!(quote.buy_price, Some(dec!(5)));
    assert_eq!(quote.sell_price, Some(dec!(10)));
}
