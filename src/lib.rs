//! StockScan Server
//!
//! Inventory barcode scan tower: decoded barcodes come in over the web
//! API, the reconciliation workflow resolves each one against the item
//! store, and the operator UI is driven over a WebSocket hub.
//!
//! ## Architecture (8 components)
//!
//! 1. ScanFeed - decoder stream boundary (bounded channel + consumer loop)
//! 2. ScanWorkflow - barcode reconciliation state machine (the core)
//! 3. RecordStore - item persistence keyed by barcode (MySQL)
//! 4. PromptBroker - new-item prompts toward the operator UI
//! 5. RealtimeHub - WebSocket distribution
//! 6. ScanLog - recent reconciliation outcomes (ring buffer)
//! 7. WebAPI - REST endpoints
//! 8. AppState - wiring and configuration
//!
//! ## Design principles
//!
//! - Single-flight: one reconciliation holds the workflow guard at a
//!   time; overlapping scans are dropped, never queued
//! - The store and the operator surface are trait seams, so the core
//!   runs against synthetic collaborators in tests

pub mod error;
pub mod interaction;
pub mod models;
pub mod realtime_hub;
pub mod record_store;
pub mod scan_feed;
pub mod scan_log;
pub mod scan_workflow;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
