//! Scan log - recent reconciliation outcomes (ring buffer)
//!
//! ## Responsibilities
//!
//! - Keep the last N reconciliation outcomes in memory
//! - Provide query access for the operator UI
//!
//! Dropped scans are not recorded here; only terminal outcomes of events
//! that held the workflow guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::scan_workflow::ScanOrigin;

/// Terminal disposition of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDisposition {
    /// Existing record shown
    Displayed,
    /// New record collected and persisted
    Created,
    /// Operator declined the new-item prompt
    Cancelled,
    /// Operator input failed validation, nothing written
    Rejected,
    /// Store failure during lookup or persist
    Failed,
}

/// One logged reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub entry_id: u64,
    pub barcode: String,
    pub origin: ScanOrigin,
    pub disposition: ScanDisposition,
    pub display_name: Option<String>,
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

/// Ring buffer for scan outcomes
struct ScanRingBuffer {
    entries: VecDeque<ScanLogEntry>,
    capacity: usize,
    next_id: u64,
}

impl ScanRingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    fn push(&mut self, mut entry: ScanLogEntry) -> u64 {
        entry.entry_id = self.next_id;
        self.next_id += 1;

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.next_id - 1
    }

    fn get_latest(&self, count: usize) -> Vec<ScanLogEntry> {
        self.entries.iter().rev().take(count).cloned().collect()
    }

    fn get_by_barcode(&self, barcode: &str, count: usize) -> Vec<ScanLogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.barcode == barcode)
            .take(count)
            .cloned()
            .collect()
    }
}

/// ScanLog instance
pub struct ScanLog {
    buffer: RwLock<ScanRingBuffer>,
}

impl ScanLog {
    /// Create new ScanLog
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(ScanRingBuffer::new(capacity)),
        }
    }

    /// Record a terminal reconciliation outcome
    pub async fn record(
        &self,
        barcode: String,
        origin: ScanOrigin,
        disposition: ScanDisposition,
        display_name: Option<String>,
        message: Option<String>,
    ) -> u64 {
        let entry = ScanLogEntry {
            entry_id: 0,
            barcode,
            origin,
            disposition,
            display_name,
            message,
            at: Utc::now(),
        };

        let mut buffer = self.buffer.write().await;
        let id = buffer.push(entry);
        tracing::debug!(entry_id = id, "Scan outcome logged");
        id
    }

    /// Get latest entries
    pub async fn get_latest(&self, count: usize) -> Vec<ScanLogEntry> {
        let buffer = self.buffer.read().await;
        buffer.get_latest(count)
    }

    /// Get entries for one barcode
    pub async fn get_by_barcode(&self, barcode: &str, count: usize) -> Vec<ScanLogEntry> {
        let buffer = self.buffer.read().await;
        buffer.get_by_barcode(barcode, count)
    }

    /// Get entry count
    pub async fn count(&self) -> usize {
        let buffer = self.buffer.read().await;
        buffer.entries.len()
    }
}
