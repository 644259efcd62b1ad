//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{CardQuote, Report};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub report: RwLock<Report>,
}

impl DashboardState {
    pub fn new(report: Report) -> Self {
        Self {
            report: RwLock::new(report),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/cards
pub async fn get_cards(State(state): State<AppState>) -> Json<Report> {
    let report = state.report.read().await;
    Json(report.clone())
}

/// GET /api/cards/:name
pub async fn get_card(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CardQuote>, (StatusCode, Json<ErrorResponse>)> {
    let report = state.report.read().await;
    match report.find(&name) {
        Some(quote) => Ok(Json(quote.clone())),
        None => {
            debug!(card = %name, "Card not in report");
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Card not found: {name}"),
                }),
            ))
        }
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
