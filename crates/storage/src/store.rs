use gagyebu_core::{OcrFields, ReceiptId, ReceiptRecord, ReceiptStore, StoreError, UserId};

use crate::db::{self, DbPool};

/// `ReceiptStore` over the SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteReceiptStore {
    pool: DbPool,
}

impl SqliteReceiptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    tracing::error!("Receipt store error: {e}");
    StoreError::Backend(e.to_string())
}

impl ReceiptStore for SqliteReceiptStore {
    async fn find_for_owner(
        &self,
        owner: &UserId,
        id: &ReceiptId,
    ) -> Result<Option<ReceiptRecord>, StoreError> {
        db::get_receipt_for_owner(&self.pool, owner, id)
            .await
            .map_err(backend)
    }

    async fn record_ocr(
        &self,
        id: &ReceiptId,
        fields: &OcrFields,
    ) -> Result<Option<ReceiptRecord>, StoreError> {
        db::record_ocr_if_unprocessed(&self.pool, id, fields)
            .await
            .map_err(backend)
    }
}
