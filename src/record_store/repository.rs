//! Record store repository
//!
//! Database access layer for the scanned_items table.

use async_trait::async_trait;
use sqlx::MySqlPool;

use super::types::{ItemRow, ItemWrite};
use super::RecordStore;
use crate::error::Result;

/// MySQL-backed record store
#[derive(Clone)]
pub struct SqlRecordStore {
    pool: MySqlPool,
}

impl SqlRecordStore {
    /// Create new store over an existing pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Item SELECT columns
    const ITEM_COLUMNS: &'static str = r#"
        barcode, name, sku, description,
        total_stock, on_floor, in_back,
        created_at, updated_at
    "#;

    /// Create the scanned_items table if it does not exist yet
    pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scanned_items (
                barcode VARCHAR(64) NOT NULL PRIMARY KEY,
                name VARCHAR(255) NULL,
                sku VARCHAR(128) NULL,
                description TEXT NULL,
                total_stock INT UNSIGNED NULL,
                on_floor INT UNSIGNED NULL,
                in_back INT UNSIGNED NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                    ON UPDATE CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqlRecordStore {
    async fn get(&self, barcode: &str) -> Result<Option<ItemRow>> {
        let query = format!(
            "SELECT {} FROM scanned_items WHERE barcode = ?",
            Self::ITEM_COLUMNS
        );
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn set(&self, barcode: &str, item: &ItemWrite) -> Result<()> {
        // Full overwrite: every payload column is written, including the
        // NULLs of a minimal record. created_at survives an overwrite.
        sqlx::query(
            r#"
            INSERT INTO scanned_items (
                barcode, name, sku, description,
                total_stock, on_floor, in_back
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                sku = VALUES(sku),
                description = VALUES(description),
                total_stock = VALUES(total_stock),
                on_floor = VALUES(on_floor),
                in_back = VALUES(in_back)
            "#,
        )
        .bind(barcode)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.description)
        .bind(item.total_stock)
        .bind(item.on_floor)
        .bind(item.in_back)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
