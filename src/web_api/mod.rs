//! WebAPI - REST API endpoints
//!
//! ## Responsibilities
//!
//! - Scan ingestion from the mobile decoder
//! - Prompt reply/cancel from the operator UI
//! - Item, scan log and stats queries
//! - WebSocket upgrade

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::{HealthResponse, ServiceStatusResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    let response = HealthResponse {
        status: if db_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: state.started_at.elapsed().as_secs(),
        db_connected: db_ok,
    };

    Json(response)
}

/// Status endpoint
pub async fn service_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServiceStatusResponse {
        service: "stockscan".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        ws_clients: state.hub.connection_count(),
    })
}
