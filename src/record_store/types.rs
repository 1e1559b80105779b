//! Record store data types
//!
//! Row, write payload and input shapes for the scanned_items table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{Error, Result};

/// Sentinel shown for descriptive fields a record never had
pub const UNKNOWN_FIELD: &str = "N/A";

/// Persisted item row (matches scanned_items table)
///
/// Every descriptive and count column is nullable: a minimal record
/// stores only its name, everything else is filled in at display time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItemRow {
    pub barcode: String,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub total_stock: Option<u32>,
    pub on_floor: Option<u32>,
    pub in_back: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRow {
    /// Resolve the row into its display form.
    ///
    /// A row without a name falls back to the barcode itself; missing
    /// descriptive fields resolve to the "N/A" sentinel, missing counts to 0.
    pub fn resolve(&self) -> InventoryRecord {
        InventoryRecord {
            barcode: self.barcode.clone(),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| self.barcode.clone()),
            sku: self
                .sku
                .clone()
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            total_stock: self.total_stock.unwrap_or(0),
            on_floor: self.on_floor.unwrap_or(0),
            in_back: self.in_back.unwrap_or(0),
        }
    }
}

/// Resolved inventory record, the shape the operator UI displays.
///
/// No relation between total_stock and on_floor + in_back is enforced;
/// the counts are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub barcode: String,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub total_stock: u32,
    pub on_floor: u32,
    pub in_back: u32,
}

/// Which form the operator is asked to fill for an unknown barcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectKind {
    /// Name only
    Minimal,
    /// Name, sku, description and the three counts
    Full,
}

/// Operator-submitted form data for a new item.
///
/// Count fields arrive as raw form strings and are coerced when the
/// write payload is assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewItemInput {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_stock: Option<String>,
    #[serde(default)]
    pub on_floor: Option<String>,
    #[serde(default)]
    pub in_back: Option<String>,
}

/// Assembled write payload. A write fully replaces the stored row;
/// there is no partial update or merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemWrite {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub total_stock: Option<u32>,
    pub on_floor: Option<u32>,
    pub in_back: Option<u32>,
}

impl ItemWrite {
    /// Assemble a write payload from operator input.
    ///
    /// The name is required for both kinds. The minimal kind stores only
    /// the name; the full kind stores the descriptive strings as given
    /// (empty string allowed) and coerces the counts.
    pub fn assemble(kind: CollectKind, input: &NewItemInput) -> Result<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("item name must not be empty".to_string()));
        }

        let write = match kind {
            CollectKind::Minimal => Self {
                name: name.to_string(),
                sku: None,
                description: None,
                total_stock: None,
                on_floor: None,
                in_back: None,
            },
            CollectKind::Full => Self {
                name: name.to_string(),
                sku: Some(input.sku.clone().unwrap_or_default()),
                description: Some(input.description.clone().unwrap_or_default()),
                total_stock: Some(coerce_count(input.total_stock.as_deref())),
                on_floor: Some(coerce_count(input.on_floor.as_deref())),
                in_back: Some(coerce_count(input.in_back.as_deref())),
            },
        };

        Ok(write)
    }

    /// Display form of a freshly written payload.
    pub fn resolve(&self, barcode: &str) -> InventoryRecord {
        InventoryRecord {
            barcode: barcode.to_string(),
            name: self.name.clone(),
            sku: self
                .sku
                .clone()
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            total_stock: self.total_stock.unwrap_or(0),
            on_floor: self.on_floor.unwrap_or(0),
            in_back: self.in_back.unwrap_or(0),
        }
    }
}

/// Coerce a raw count field to a non-negative integer.
///
/// Anything that does not parse (including negative values) becomes 0
/// instead of rejecting the whole record.
pub fn coerce_count(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewItemInput {
        NewItemInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(Some("42")), 42);
        assert_eq!(coerce_count(Some(" 12 ")), 12);
        assert_eq!(coerce_count(Some("abc")), 0);
        assert_eq!(coerce_count(Some("-5")), 0);
        assert_eq!(coerce_count(Some("")), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn test_assemble_rejects_empty_name() {
        let err = ItemWrite::assemble(CollectKind::Minimal, &input("   ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = ItemWrite::assemble(CollectKind::Full, &input("")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_assemble_minimal_stores_name_only() {
        let write = ItemWrite::assemble(CollectKind::Minimal, &input(" Widget ")).unwrap();
        assert_eq!(write.name, "Widget");
        assert_eq!(write.sku, None);
        assert_eq!(write.total_stock, None);
    }

    #[test]
    fn test_assemble_full_coerces_counts() {
        let raw = NewItemInput {
            name: "Bolt".to_string(),
            sku: Some("B-100".to_string()),
            description: None,
            total_stock: Some("50".to_string()),
            on_floor: Some("abc".to_string()),
            in_back: None,
        };
        let write = ItemWrite::assemble(CollectKind::Full, &raw).unwrap();
        assert_eq!(write.sku.as_deref(), Some("B-100"));
        assert_eq!(write.description.as_deref(), Some(""));
        assert_eq!(write.total_stock, Some(50));
        assert_eq!(write.on_floor, Some(0));
        assert_eq!(write.in_back, Some(0));
    }

    #[test]
    fn test_row_resolve_falls_back() {
        let row = ItemRow {
            barcode: "012345".to_string(),
            name: None,
            sku: None,
            description: Some("rear shelf".to_string()),
            total_stock: Some(7),
            on_floor: None,
            in_back: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record = row.resolve();
        assert_eq!(record.name, "012345");
        assert_eq!(record.sku, UNKNOWN_FIELD);
        assert_eq!(record.description, "rear shelf");
        assert_eq!(record.total_stock, 7);
        assert_eq!(record.on_floor, 0);
    }
}
