//! Shared data models

use serde::{Deserialize, Serialize};

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: &str, message: &str) -> ApiResponse<T> {
        ApiResponse {
            ok: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub db_connected: bool,
}

/// Service status response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatusResponse {
    pub service: String,
    pub version: String,
    pub status: String,
    pub ws_clients: u64,
}

/// Response body for scan submission
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanAcceptedResponse {
    pub accepted: bool,
}
