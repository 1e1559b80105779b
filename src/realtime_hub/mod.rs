//! RealtimeHub - WebSocket distribution
//!
//! ## Responsibilities
//!
//! - WebSocket connection management
//! - Broadcasting reconciliation outcomes to the operator UI
//! - Pushing new-item prompts and their lifecycle to the UI
//!
//! The hub carries notifications only; the currently open prompt can be
//! re-fetched via HTTP GET /api/prompt after a reconnect.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::record_store::{CollectKind, InventoryRecord};

/// Hub message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum HubMessage {
    /// A barcode resolved to a record, either found or freshly created
    RecordResolved(RecordResolvedMessage),
    /// An unknown barcode opened a new-item prompt
    PromptOpened(PromptOpenedMessage),
    /// The open prompt was submitted, cancelled or timed out
    PromptClosed(PromptClosedMessage),
    /// A reconciliation failed (store error or rejected input)
    ScanFailed(ScanFailedMessage),
}

/// Record resolution notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResolvedMessage {
    pub record: InventoryRecord,
    /// true when the record was just created from operator input
    pub created: bool,
    pub timestamp: String,
}

/// Prompt opened notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOpenedMessage {
    pub prompt_id: String,
    pub barcode: String,
    pub kind: CollectKind,
    pub opened_at: String,
}

/// Prompt closed notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptClosedMessage {
    pub prompt_id: String,
    pub barcode: String,
    /// "submitted", "cancelled" or "timeout"
    pub reason: String,
}

/// Scan failure notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailedMessage {
    pub barcode: String,
    pub message: String,
    pub timestamp: String,
}

/// Client connection
struct ClientConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// RealtimeHub instance
pub struct RealtimeHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl RealtimeHub {
    /// Create new RealtimeHub
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, ClientConnection { id, tx });
        }

        self.connection_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(connection_id = %id, "Client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Client disconnected");
        }
    }

    /// Broadcast message to all clients
    pub async fn broadcast(&self, message: HubMessage) {
        let msg_type = match &message {
            HubMessage::RecordResolved(_) => "record_resolved",
            HubMessage::PromptOpened(_) => "prompt_opened",
            HubMessage::PromptClosed(_) => "prompt_closed",
            HubMessage::ScanFailed(_) => "scan_failed",
        };
        tracing::debug!(message_type = %msg_type, "Broadcasting message to clients");

        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize message");
                return;
            }
        };

        let connections = self.connections.read().await;
        for conn in connections.values() {
            if let Err(e) = conn.tx.send(json.clone()) {
                tracing::warn!(connection_id = %conn.id, error = %e, "Failed to send message");
            }
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_registered_clients() {
        let hub = RealtimeHub::new();
        let (id, mut rx) = hub.register().await;
        assert_eq!(hub.connection_count(), 1);

        hub.broadcast(HubMessage::ScanFailed(ScanFailedMessage {
            barcode: "000111".to_string(),
            message: "store offline".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }))
        .await;

        let raw = rx.recv().await.expect("message");
        assert!(raw.contains("scan_failed"));
        assert!(raw.contains("000111"));

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count(), 0);
    }
}
