//! Scan feed - decoder stream boundary
//!
//! ## Responsibilities
//!
//! - Accept decoded barcode events pushed over the web API
//! - Hand each event to the reconciliation workflow
//!
//! The feed is a bounded channel with a consumer loop that spawns one
//! reconciliation task per event, so an event arriving while another
//! reconciliation holds the guard reaches the workflow immediately and
//! is dropped there instead of queueing behind the open prompt.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};
use crate::scan_workflow::{DecodedScan, ScanWorkflow};

/// ScanFeed instance
pub struct ScanFeed {
    tx: mpsc::Sender<DecodedScan>,
    rx: Mutex<Option<mpsc::Receiver<DecodedScan>>>,
}

impl ScanFeed {
    /// Create new ScanFeed with a bounded buffer
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Push a decoded scan into the feed.
    ///
    /// Rejects immediately when the buffer is full rather than blocking
    /// the producer.
    pub fn submit(&self, scan: DecodedScan) -> Result<()> {
        self.tx.try_send(scan).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                Error::Busy("scan feed is at capacity".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                Error::Internal("scan feed is closed".to_string())
            }
        })
    }

    /// Start the consumer loop
    pub async fn start(&self, workflow: Arc<ScanWorkflow>) {
        let Some(mut rx) = self.rx.lock().await.take() else {
            tracing::warn!("Scan feed already started");
            return;
        };

        tracing::info!("Starting scan feed consumer");

        tokio::spawn(async move {
            while let Some(scan) = rx.recv().await {
                let workflow = workflow.clone();
                tokio::spawn(async move {
                    workflow.process(scan).await;
                });
            }

            tracing::info!("Scan feed consumer stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan_workflow::ScanOrigin;

    fn scan(barcode: &str) -> DecodedScan {
        DecodedScan {
            barcode: barcode.to_string(),
            origin: ScanOrigin::Scan,
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_when_full() {
        let feed = ScanFeed::new(1);
        feed.submit(scan("a")).unwrap();

        let err = feed.submit(scan("b")).unwrap_err();
        assert!(matches!(err, Error::Busy(_)));
    }
}
