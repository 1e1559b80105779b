//! Scan reconciliation workflow
//!
//! ## Responsibilities
//!
//! - Resolve each decoded barcode to "display existing record" or
//!   "collect new record and persist it", exactly once per event
//! - Hold the single-flight guard: one reconciliation in flight at a
//!   time, workflow-wide; overlapping scans are dropped, never queued
//! - Surface every failure and release the guard on every terminal path
//!
//! The guard is the phase itself: a scan is only admitted by an atomic
//! Idle -> LookingUp transition, and `process` funnels every outcome
//! (display, cancel, rejection, store failure) through one release
//! point back to Idle. The store and the operator surface sit behind
//! traits so the workflow can be driven by synthetic collaborators.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::interaction::{InteractionSurface, PromptResponse};
use crate::record_store::{CollectKind, InventoryRecord, ItemWrite, RecordStore};
use crate::scan_log::{ScanDisposition, ScanLog};

/// Which screen produced the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrigin {
    /// Camera scan screen - unknown items get the name-only prompt
    Scan,
    /// Item detail screen - unknown items get the full form
    Detail,
}

impl Default for ScanOrigin {
    fn default() -> Self {
        Self::Scan
    }
}

impl ScanOrigin {
    pub fn collect_kind(self) -> CollectKind {
        match self {
            Self::Scan => CollectKind::Minimal,
            Self::Detail => CollectKind::Full,
        }
    }
}

/// One decoded barcode event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedScan {
    pub barcode: String,
    #[serde(default)]
    pub origin: ScanOrigin,
}

/// Workflow phase. Anything other than Idle holds the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    LookingUp,
    AwaitingInput,
    Persisting,
    Displaying,
    ReportingError,
}

impl ScanPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LookingUp => "looking_up",
            Self::AwaitingInput => "awaiting_input",
            Self::Persisting => "persisting",
            Self::Displaying => "displaying",
            Self::ReportingError => "reporting_error",
        }
    }
}

/// Terminal result of one scan event
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// Guard was held by another event; scan ignored
    Dropped,
    /// Existing record displayed, nothing written
    Displayed(InventoryRecord),
    /// New record collected, persisted and displayed
    Created(InventoryRecord),
    /// Operator declined the prompt, nothing written
    Cancelled,
    /// Operator input failed validation, nothing written
    Rejected(String),
    /// Store failure during lookup or persist
    Failed(String),
}

/// Workflow counters
#[derive(Debug, Default)]
pub struct ScanStats {
    received: AtomicU64,
    dropped: AtomicU64,
    displayed: AtomicU64,
    created: AtomicU64,
    cancelled: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Counter snapshot for the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatsSnapshot {
    pub received: u64,
    pub dropped: u64,
    pub displayed: u64,
    pub created: u64,
    pub cancelled: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl ScanStats {
    fn snapshot(&self) -> ScanStatsSnapshot {
        ScanStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            displayed: self.displayed.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// ScanWorkflow instance
pub struct ScanWorkflow {
    store: Arc<dyn RecordStore>,
    surface: Arc<dyn InteractionSurface>,
    scan_log: Arc<ScanLog>,
    phase: RwLock<ScanPhase>,
    stats: ScanStats,
}

impl ScanWorkflow {
    /// Create new ScanWorkflow
    pub fn new(
        store: Arc<dyn RecordStore>,
        surface: Arc<dyn InteractionSurface>,
        scan_log: Arc<ScanLog>,
    ) -> Self {
        Self {
            store,
            surface,
            scan_log,
            phase: RwLock::new(ScanPhase::Idle),
            stats: ScanStats::default(),
        }
    }

    /// Current phase
    pub async fn phase(&self) -> ScanPhase {
        *self.phase.read().await
    }

    /// Counter snapshot
    pub fn stats_snapshot(&self) -> ScanStatsSnapshot {
        self.stats.snapshot()
    }

    /// Drive one barcode event end to end.
    ///
    /// Never fails the caller: store and input failures are surfaced to
    /// the operator and folded into the outcome, and the guard is
    /// released on every path.
    pub async fn process(&self, scan: DecodedScan) -> ScanOutcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        if !self.try_begin().await {
            // Guard held: drop, never queue. The scanner will simply
            // re-detect the same barcode on a later frame.
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(barcode = %scan.barcode, "Scan dropped, reconciliation in flight");
            return ScanOutcome::Dropped;
        }

        let outcome = match self.reconcile(&scan).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.set_phase(ScanPhase::ReportingError).await;
                let message = err.to_string();
                tracing::error!(barcode = %scan.barcode, error = %message, "Reconciliation failed");
                self.surface.report_error(&scan.barcode, &message).await;
                ScanOutcome::Failed(message)
            }
        };

        // Single release point: every terminal path runs through here.
        self.set_phase(ScanPhase::Idle).await;
        self.note_outcome(&scan, &outcome).await;
        outcome
    }

    async fn reconcile(&self, scan: &DecodedScan) -> Result<ScanOutcome> {
        let row = self
            .store
            .get(&scan.barcode)
            .await
            .map_err(|e| Error::Lookup(e.to_string()))?;

        if let Some(row) = row {
            let record = row.resolve();
            self.set_phase(ScanPhase::Displaying).await;
            self.surface.display(&record, false).await;
            return Ok(ScanOutcome::Displayed(record));
        }

        self.set_phase(ScanPhase::AwaitingInput).await;
        let kind = scan.origin.collect_kind();
        let input = match self.surface.collect(&scan.barcode, kind).await? {
            PromptResponse::Submitted(input) => input,
            PromptResponse::Cancelled => return Ok(ScanOutcome::Cancelled),
        };

        let write = match ItemWrite::assemble(kind, &input) {
            Ok(write) => write,
            Err(err) => {
                let message = err.to_string();
                self.surface.report_error(&scan.barcode, &message).await;
                return Ok(ScanOutcome::Rejected(message));
            }
        };

        self.set_phase(ScanPhase::Persisting).await;
        self.store
            .set(&scan.barcode, &write)
            .await
            .map_err(|e| Error::Persist(e.to_string()))?;

        let record = write.resolve(&scan.barcode);
        self.set_phase(ScanPhase::Displaying).await;
        self.surface.display(&record, true).await;
        Ok(ScanOutcome::Created(record))
    }

    /// Admit a scan only from Idle
    async fn try_begin(&self) -> bool {
        let mut phase = self.phase.write().await;
        if *phase != ScanPhase::Idle {
            return false;
        }
        *phase = ScanPhase::LookingUp;
        true
    }

    async fn set_phase(&self, next: ScanPhase) {
        let mut phase = self.phase.write().await;
        tracing::debug!(from = phase.as_str(), to = next.as_str(), "Phase transition");
        *phase = next;
    }

    async fn note_outcome(&self, scan: &DecodedScan, outcome: &ScanOutcome) {
        let (counter, disposition, display_name, message) = match outcome {
            // Counted at the gate, not logged
            ScanOutcome::Dropped => return,
            ScanOutcome::Displayed(record) => (
                &self.stats.displayed,
                ScanDisposition::Displayed,
                Some(record.name.clone()),
                None,
            ),
            ScanOutcome::Created(record) => (
                &self.stats.created,
                ScanDisposition::Created,
                Some(record.name.clone()),
                None,
            ),
            ScanOutcome::Cancelled => (&self.stats.cancelled, ScanDisposition::Cancelled, None, None),
            ScanOutcome::Rejected(msg) => (
                &self.stats.rejected,
                ScanDisposition::Rejected,
                None,
                Some(msg.clone()),
            ),
            ScanOutcome::Failed(msg) => (
                &self.stats.failed,
                ScanDisposition::Failed,
                None,
                Some(msg.clone()),
            ),
        };

        counter.fetch_add(1, Ordering::Relaxed);
        self.scan_log
            .record(
                scan.barcode.clone(),
                scan.origin,
                disposition,
                display_name,
                message,
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_selects_collect_kind() {
        assert_eq!(ScanOrigin::Scan.collect_kind(), CollectKind::Minimal);
        assert_eq!(ScanOrigin::Detail.collect_kind(), CollectKind::Full);
    }

    #[test]
    fn test_stats_snapshot_starts_zeroed() {
        let stats = ScanStats::default();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.received, 0);
        assert_eq!(snapshot.dropped, 0);
        assert_eq!(snapshot.failed, 0);
    }
}
