use std::future::Future;
use thiserror::Error;

use super::receipt::{OcrFields, ReceiptId, ReceiptRecord, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persistence boundary for receipt records.
pub trait ReceiptStore: Send + Sync {
    /// Look up a receipt, but only if it belongs to `owner`.
    fn find_for_owner(
        &self,
        owner: &UserId,
        id: &ReceiptId,
    ) -> impl Future<Output = Result<Option<ReceiptRecord>, StoreError>> + Send;

    /// Write all four OCR fields in one update, guarded on the receipt still
    /// being unprocessed. Returns `None` when the guard fails (the receipt was
    /// already processed or no longer exists), in which case nothing changed.
    fn record_ocr(
        &self,
        id: &ReceiptId,
        fields: &OcrFields,
    ) -> impl Future<Output = Result<Option<ReceiptRecord>, StoreError>> + Send;
}
