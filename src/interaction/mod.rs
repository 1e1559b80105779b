//! Interaction surface - operator prompts and record display
//!
//! ## Responsibilities
//!
//! - Display resolved records to the operator UI (hub broadcast)
//! - Solicit new-item data for unknown barcodes via a single open prompt
//! - Surface reconciliation errors to the UI
//!
//! The single-flight guard in the workflow guarantees at most one prompt
//! is open at a time, matching the one-active-dialog constraint of the
//! scanner UI. An abandoned prompt is closed as a cancellation after a
//! configurable timeout so a vanished UI cannot hold the guard forever.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::realtime_hub::{
    HubMessage, PromptClosedMessage, PromptOpenedMessage, RealtimeHub, RecordResolvedMessage,
    ScanFailedMessage,
};
use crate::record_store::{CollectKind, InventoryRecord, NewItemInput};

/// Operator's answer to a new-item prompt
#[derive(Debug, Clone)]
pub enum PromptResponse {
    Submitted(NewItemInput),
    Cancelled,
}

/// What the reconciliation workflow needs from the human-facing side.
#[async_trait]
pub trait InteractionSurface: Send + Sync {
    /// Show a resolved record
    async fn display(&self, record: &InventoryRecord, created: bool);

    /// Ask for new-item data; resolves when the operator submits or cancels
    async fn collect(&self, barcode: &str, kind: CollectKind) -> Result<PromptResponse>;

    /// Surface a human-readable failure message
    async fn report_error(&self, barcode: &str, message: &str);
}

/// Currently open prompt, as exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct OpenPrompt {
    pub prompt_id: Uuid,
    pub barcode: String,
    pub kind: CollectKind,
    pub opened_at: DateTime<Utc>,
}

/// Pending prompt with its reply channel
struct PendingPrompt {
    prompt: OpenPrompt,
    reply_tx: oneshot::Sender<PromptResponse>,
}

/// PromptBroker instance
///
/// Holds the single open prompt and routes the operator's reply back
/// into the waiting reconciliation.
pub struct PromptBroker {
    hub: Arc<RealtimeHub>,
    pending: RwLock<Option<PendingPrompt>>,
    timeout: Duration,
}

impl PromptBroker {
    /// Create new PromptBroker
    pub fn new(hub: Arc<RealtimeHub>, timeout: Duration) -> Self {
        Self {
            hub,
            pending: RwLock::new(None),
            timeout,
        }
    }

    /// Currently open prompt, if any
    pub async fn current(&self) -> Option<OpenPrompt> {
        let pending = self.pending.read().await;
        pending.as_ref().map(|p| p.prompt.clone())
    }

    /// Route an operator submission to the open prompt
    pub async fn submit(&self, prompt_id: Uuid, input: NewItemInput) -> Result<()> {
        self.resolve(prompt_id, PromptResponse::Submitted(input))
            .await
    }

    /// Cancel the open prompt
    pub async fn cancel(&self, prompt_id: Uuid) -> Result<()> {
        self.resolve(prompt_id, PromptResponse::Cancelled).await
    }

    async fn resolve(&self, prompt_id: Uuid, response: PromptResponse) -> Result<()> {
        let pending = {
            let mut slot = self.pending.write().await;
            match slot.take() {
                Some(p) if p.prompt.prompt_id == prompt_id => p,
                Some(p) => {
                    *slot = Some(p);
                    return Err(Error::NotFound(format!("prompt {} is not open", prompt_id)));
                }
                None => return Err(Error::NotFound("no prompt is open".to_string())),
            }
        };

        pending
            .reply_tx
            .send(response)
            .map_err(|_| Error::Conflict("prompt is no longer waiting".to_string()))
    }
}

#[async_trait]
impl InteractionSurface for PromptBroker {
    async fn display(&self, record: &InventoryRecord, created: bool) {
        self.hub
            .broadcast(HubMessage::RecordResolved(RecordResolvedMessage {
                record: record.clone(),
                created,
                timestamp: Utc::now().to_rfc3339(),
            }))
            .await;
    }

    async fn collect(&self, barcode: &str, kind: CollectKind) -> Result<PromptResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let prompt = OpenPrompt {
            prompt_id: Uuid::new_v4(),
            barcode: barcode.to_string(),
            kind,
            opened_at: Utc::now(),
        };

        {
            let mut slot = self.pending.write().await;
            if slot.is_some() {
                return Err(Error::Internal(
                    "a prompt is already open".to_string(),
                ));
            }
            *slot = Some(PendingPrompt {
                prompt: prompt.clone(),
                reply_tx,
            });
        }

        self.hub
            .broadcast(HubMessage::PromptOpened(PromptOpenedMessage {
                prompt_id: prompt.prompt_id.to_string(),
                barcode: prompt.barcode.clone(),
                kind,
                opened_at: prompt.opened_at.to_rfc3339(),
            }))
            .await;

        let (response, reason) = match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(PromptResponse::Submitted(input))) => {
                (PromptResponse::Submitted(input), "submitted")
            }
            Ok(Ok(PromptResponse::Cancelled)) => (PromptResponse::Cancelled, "cancelled"),
            // Reply channel dropped without an answer
            Ok(Err(_)) => (PromptResponse::Cancelled, "cancelled"),
            Err(_) => {
                tracing::warn!(barcode = %barcode, "Prompt timed out, treating as cancelled");
                (PromptResponse::Cancelled, "timeout")
            }
        };

        // On the timeout path the pending slot was never taken
        {
            let mut slot = self.pending.write().await;
            if slot
                .as_ref()
                .map(|p| p.prompt.prompt_id == prompt.prompt_id)
                .unwrap_or(false)
            {
                *slot = None;
            }
        }

        self.hub
            .broadcast(HubMessage::PromptClosed(PromptClosedMessage {
                prompt_id: prompt.prompt_id.to_string(),
                barcode: prompt.barcode.clone(),
                reason: reason.to_string(),
            }))
            .await;

        Ok(response)
    }

    async fn report_error(&self, barcode: &str, message: &str) {
        self.hub
            .broadcast(HubMessage::ScanFailed(ScanFailedMessage {
                barcode: barcode.to_string(),
                message: message.to_string(),
                timestamp: Utc::now().to_rfc3339(),
            }))
            .await;
    }
}
