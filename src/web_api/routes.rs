//! API routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{ApiResponse, ScanAcceptedResponse};
use crate::record_store::{NewItemInput, RecordStore};
use crate::scan_workflow::DecodedScan;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/healthz", get(super::health_check))
        .route("/api/status", get(super::service_status))
        // Scans (decoder stream ingestion)
        .route("/api/scans", post(submit_scan))
        // Items
        .route("/api/items/:barcode", get(get_item))
        // New-item prompt
        .route("/api/prompt", get(current_prompt))
        .route("/api/prompt/:id/reply", post(reply_prompt))
        .route("/api/prompt/:id/cancel", post(cancel_prompt))
        // Scan log & stats
        .route("/api/scan-log", get(list_scan_log))
        .route("/api/stats", get(workflow_stats))
        // WebSocket
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Push a decoded barcode into the scan feed
async fn submit_scan(
    State(state): State<AppState>,
    Json(scan): Json<DecodedScan>,
) -> Result<impl IntoResponse> {
    if scan.barcode.trim().is_empty() {
        return Err(Error::Validation("barcode must not be empty".to_string()));
    }

    state.feed.submit(scan)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(ScanAcceptedResponse { accepted: true })),
    ))
}

/// Fetch the resolved record for a barcode
async fn get_item(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse> {
    match state.store.get(&barcode).await? {
        Some(row) => Ok(Json(ApiResponse::success(row.resolve()))),
        None => Err(Error::NotFound(format!("no item for barcode {}", barcode))),
    }
}

/// Currently open new-item prompt, if any
async fn current_prompt(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.broker.current().await))
}

/// Operator submits the new-item form
async fn reply_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewItemInput>,
) -> Result<impl IntoResponse> {
    state.broker.submit(id, input).await?;
    Ok(Json(ApiResponse::success("submitted")))
}

/// Operator declines the new-item prompt
async fn cancel_prompt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.broker.cancel(id).await?;
    Ok(Json(ApiResponse::success("cancelled")))
}

#[derive(Debug, Deserialize)]
struct ScanLogQuery {
    count: Option<usize>,
    barcode: Option<String>,
}

/// Recent reconciliation outcomes
async fn list_scan_log(
    State(state): State<AppState>,
    Query(query): Query<ScanLogQuery>,
) -> impl IntoResponse {
    let count = query.count.unwrap_or(50);
    let entries = match query.barcode {
        Some(barcode) => state.scan_log.get_by_barcode(&barcode, count).await,
        None => state.scan_log.get_latest(count).await,
    };

    Json(ApiResponse::success(entries))
}

/// Workflow counters
async fn workflow_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.workflow.stats_snapshot()))
}

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.hub.register().await;

    tracing::info!(connection_id = %conn_id, "WebSocket client connected");

    // Forward hub messages to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Inbound side only watches for the close
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    send_task.abort();
    state.hub.unregister(&conn_id).await;
}
