pub mod extract;
pub mod format;
pub mod locks;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use extract::{expand_two_digit_year, extract_amount, extract_date, normalize_text, Extractor};
pub use format::is_rasterizable;
pub use locks::ReceiptLocks;
pub use pipeline::{
    resolve_under, ErrorKind, ProcessError, ProcessorConfig, ReceiptProcessor,
    DEFAULT_OCR_TIMEOUT, DEFAULT_URL_PREFIX,
};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::{ExtractedReceipt, RawOcrResult, KOREAN_ENGLISH};
