//! Dashboard: Axum web server exposing the latest comparison report.
//!
//! Read-only JSON API. CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, DashboardState};

/// Serve the dashboard until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard server starting on http://localhost:{port}");

    axum::serve(listener, app)
        .await
        .context("Dashboard server error")
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/cards", get(routes::get_cards))
        .route("/api/cards/:name", get(routes::get_card))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardQuote, Report};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        Arc::new(DashboardState::new(Report::new(
            chrono::Utc::now(),
            vec![
                CardQuote::new("Umbreon VMAX 215", Some(dec!(420)), Some(dec!(650))),
                CardQuote::new("Mew ex 151", None, Some(dec!(88))),
            ],
        )))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, _) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cards_endpoint() {
        let (status, json) = get_json("/api/cards").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_cards"], 2);
        assert_eq!(json["cards"][0]["Potential Profit"].as_f64(), Some(230.0));
        assert!(json["cards"][1]["ACE 10"].is_null());
        assert!(json["last_updated"].is_string());
    }

    #[tokio::test]
    async fn test_single_card_endpoint() {
        let (status, json) = get_json("/api/cards/mew%20ex%20151").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["card_name"], "Mew ex 151");
        assert_eq!(json["PSA 10"].as_f64(), Some(88.0));
        assert!(json["Potential Profit"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_card_is_404() {
        let (status, json) = get_json("/api/cards/Mewtwo").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("Mewtwo"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get_json("/api/trades").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
