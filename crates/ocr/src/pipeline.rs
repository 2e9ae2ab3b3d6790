use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gagyebu_core::{OcrFields, ReceiptId, ReceiptRecord, ReceiptStore, StoreError, UserId};
use thiserror::Error;

use crate::extract::Extractor;
use crate::format;
use crate::locks::ReceiptLocks;
use crate::recognizer::OcrBackend;
use crate::types::{RawOcrResult, KOREAN_ENGLISH};

pub const DEFAULT_URL_PREFIX: &str = "/uploads/receipts/";
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(120);

/// Stable, transport-independent classification of a processing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    AlreadyProcessed,
    UnsupportedFormat,
    InvalidPath,
    FileNotFound,
    OcrEngineFailure,
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyProcessed => "already_processed",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::OcrEngineFailure => "ocr_engine_failure",
            ErrorKind::Storage => "storage",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Receipt not found: {0}")]
    NotFound(ReceiptId),
    #[error("Receipt {0} has already been processed")]
    AlreadyProcessed(ReceiptId),
    #[error("OCR is not supported for '{0}' files")]
    UnsupportedFormat(String),
    #[error("Invalid receipt path: {0}")]
    InvalidPath(String),
    #[error("Receipt file not found at {}: {source}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("OCR processing failed: {0}")]
    OcrEngineFailure(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Unauthorized => ErrorKind::Unauthorized,
            ProcessError::NotFound(_) => ErrorKind::NotFound,
            ProcessError::AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            ProcessError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ProcessError::InvalidPath(_) => ErrorKind::InvalidPath,
            ProcessError::FileNotFound { .. } => ErrorKind::FileNotFound,
            ProcessError::OcrEngineFailure(_) => ErrorKind::OcrEngineFailure,
            ProcessError::Store(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Directory that backs `url_prefix` on disk.
    pub upload_dir: PathBuf,
    /// Every stored receipt url must start with this.
    pub url_prefix: String,
    /// Language hint handed to the OCR engine.
    pub language: String,
    pub ocr_timeout: Duration,
}

impl ProcessorConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            language: KOREAN_ENGLISH.to_string(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

/// Orchestrates: preconditions → file read → OCR → extract → one guarded write.
pub struct ReceiptProcessor<R: OcrBackend + ?Sized, S: ReceiptStore> {
    recognizer: Arc<R>,
    store: S,
    config: ProcessorConfig,
    locks: ReceiptLocks,
}

impl<R, S> ReceiptProcessor<R, S>
where
    R: OcrBackend + ?Sized + 'static,
    S: ReceiptStore,
{
    pub fn new(recognizer: Arc<R>, store: S, config: ProcessorConfig) -> Self {
        Self { recognizer, store, config, locks: ReceiptLocks::new() }
    }

    /// Map a stored url onto the upload directory. The url must sit under the
    /// configured prefix and the remainder must be a plain relative path.
    pub fn resolve_path(&self, url: &str) -> Result<PathBuf, ProcessError> {
        resolve_under(&self.config.upload_dir, &self.config.url_prefix, url)
    }

    /// Run OCR for one receipt and persist the result.
    ///
    /// Preconditions are checked in a fixed order, each with its own error:
    /// caller identity, ownership, not yet processed, rasterizable format,
    /// path containment, file readable. Nothing is written unless every step
    /// succeeds, and then all four OCR fields are written together.
    pub async fn process(
        &self,
        caller: Option<&UserId>,
        id: &ReceiptId,
    ) -> Result<ReceiptRecord, ProcessError> {
        let owner = caller.ok_or(ProcessError::Unauthorized)?;

        // A second concurrent run for this receipt waits here and then sees
        // the first run's result as already processed.
        let _lease = self.locks.acquire(id).await;

        let receipt = self
            .store
            .find_for_owner(owner, id)
            .await?
            .ok_or_else(|| ProcessError::NotFound(id.clone()))?;

        if receipt.is_processed() {
            return Err(ProcessError::AlreadyProcessed(id.clone()));
        }

        if !format::is_rasterizable(&receipt.mime) {
            return Err(ProcessError::UnsupportedFormat(receipt.mime));
        }

        let path = match self.resolve_path(&receipt.url) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(
                    receipt_id = %id,
                    url = %receipt.url,
                    "Stored receipt path is outside the upload root"
                );
                return Err(e);
            }
        };

        let bytes = tokio::fs::read(&path).await.map_err(|source| {
            tracing::warn!(receipt_id = %id, path = %path.display(), "Receipt file unreadable: {source}");
            ProcessError::FileNotFound { path: path.clone(), source }
        })?;

        tracing::info!(receipt_id = %id, bytes = bytes.len(), "OCR started");
        let raw = self.recognize(id, bytes).await?;

        let extracted = Extractor::extract(&raw.text);
        let confidence = raw.confidence_fraction();
        tracing::info!(
            receipt_id = %id,
            confidence,
            amount = %extracted.amount.map(|w| w.to_string()).unwrap_or_default(),
            date = ?extracted.date,
            "OCR finished"
        );

        let fields = OcrFields {
            ocr_text: raw.text,
            ocr_amount: extracted.amount,
            ocr_date: extracted.date,
            ocr_confidence: confidence,
        };

        self.store.record_ocr(id, &fields).await?.ok_or_else(|| {
            tracing::warn!(receipt_id = %id, "Receipt was processed elsewhere; result discarded");
            ProcessError::AlreadyProcessed(id.clone())
        })
    }

    async fn recognize(&self, id: &ReceiptId, bytes: Vec<u8>) -> Result<RawOcrResult, ProcessError> {
        let recognizer = Arc::clone(&self.recognizer);
        let language = self.config.language.clone();
        let task = tokio::task::spawn_blocking(move || recognizer.recognize(&bytes, &language));

        // On timeout the blocking thread runs to completion on its own; its
        // result is dropped.
        match tokio::time::timeout(self.config.ocr_timeout, task).await {
            Ok(Ok(Ok(raw))) => Ok(raw),
            Ok(Ok(Err(e))) => {
                tracing::error!(receipt_id = %id, "OCR engine error: {e}");
                Err(ProcessError::OcrEngineFailure(e.to_string()))
            }
            Ok(Err(join)) => {
                tracing::error!(receipt_id = %id, "OCR task failed: {join}");
                Err(ProcessError::OcrEngineFailure(join.to_string()))
            }
            Err(_) => {
                tracing::error!(receipt_id = %id, timeout = ?self.config.ocr_timeout, "OCR timed out");
                Err(ProcessError::OcrEngineFailure(format!(
                    "timed out after {:?}",
                    self.config.ocr_timeout
                )))
            }
        }
    }
}

/// Shared by the orchestrator and anything else that touches stored files.
pub fn resolve_under(upload_dir: &Path, url_prefix: &str, url: &str) -> Result<PathBuf, ProcessError> {
    let invalid = || ProcessError::InvalidPath(url.to_string());
    let rest = url.strip_prefix(url_prefix).ok_or_else(invalid)?;
    let rel = Path::new(rest);
    if rest.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid());
    }
    Ok(upload_dir.join(rel))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
