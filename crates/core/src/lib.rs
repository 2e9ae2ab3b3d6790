pub mod money;
pub mod receipt;
pub mod store;

pub use money::Won;
pub use receipt::{OcrFields, OcrStatus, ReceiptId, ReceiptRecord, UserId};
pub use store::{ReceiptStore, StoreError};
