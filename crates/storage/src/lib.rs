pub mod db;
pub mod store;

pub use db::{
    correct_ocr_fields, create_db, delete_receipt, get_receipt_for_owner, insert_receipt,
    list_receipts, record_ocr_if_unprocessed, DbPool, NewReceipt, OcrCorrection,
};
pub use store::SqliteReceiptStore;
