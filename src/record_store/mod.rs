//! Record store - item persistence keyed by barcode
//!
//! ## Responsibilities
//!
//! - Item lookup by decoded barcode (get-one)
//! - Item writes as full row overwrites (set-one)
//! - Table bootstrap at startup
//!
//! The store exposes no delete, no list and no transaction; the
//! reconciliation workflow is its only writer. Reads always hit the
//! database - a re-scan of the same barcode re-queries rather than
//! serving a cached record.

mod repository;
mod types;

pub use repository::SqlRecordStore;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Asynchronous key-value contract the reconciliation workflow consumes.
///
/// Kept narrow so the workflow can be exercised against a synthetic
/// store in tests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the row for a barcode, None when the item is unknown
    async fn get(&self, barcode: &str) -> Result<Option<ItemRow>>;

    /// Overwrite the row for a barcode with the assembled payload
    async fn set(&self, barcode: &str, item: &ItemWrite) -> Result<()>;
}
