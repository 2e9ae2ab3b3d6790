//! Shared application state.

use std::sync::Arc;

use gagyebu_ocr::{OcrBackend, ProcessorConfig, ReceiptProcessor};
use gagyebu_storage::{DbPool, SqliteReceiptStore};

use crate::auth::JwtKeys;
use crate::config::{Config, StorageConfig};

pub type Processor = ReceiptProcessor<dyn OcrBackend, SqliteReceiptStore>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub processor: Arc<Processor>,
    pub jwt: Arc<JwtKeys>,
    pub storage: Arc<StorageConfig>,
}

impl AppState {
    pub fn new(config: &Config, pool: DbPool, recognizer: Arc<dyn OcrBackend>) -> Self {
        let processor_config = ProcessorConfig {
            upload_dir: config.storage.upload_dir.clone(),
            url_prefix: config.storage.url_prefix.clone(),
            language: config.ocr.language.clone(),
            ocr_timeout: config.ocr.timeout(),
        };
        let store = SqliteReceiptStore::new(pool.clone());

        Self {
            pool,
            processor: Arc::new(ReceiptProcessor::new(recognizer, store, processor_config)),
            jwt: Arc::new(JwtKeys::from_secret(config.auth.jwt_secret.as_bytes())),
            storage: Arc::new(config.storage.clone()),
        }
    }
}
