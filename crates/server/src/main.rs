use std::sync::Arc;

use anyhow::Context;
use gagyebu_ocr::OcrBackend;
use gagyebu_server::{app, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init("gagyebu-server", "info,gagyebu_server=debug,tower_http=info");

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::create_dir_all(&config.storage.upload_dir).with_context(|| {
        format!("Failed to create {}", config.storage.upload_dir.display())
    })?;

    let pool = gagyebu_storage::create_db(&config.database.path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path.display()))?;
    tracing::info!(path = %config.database.path.display(), "Database ready");

    let state = AppState::new(&config, pool, recognizer(&config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

#[cfg(feature = "tesseract")]
fn recognizer(config: &Config) -> Arc<dyn OcrBackend> {
    use gagyebu_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    tracing::info!(language = %config.ocr.language, "Using Tesseract OCR backend");
    Arc::new(TesseractRecognizer::new(config.ocr.tessdata_dir.clone()))
}

#[cfg(not(feature = "tesseract"))]
fn recognizer(_config: &Config) -> Arc<dyn OcrBackend> {
    tracing::warn!("Built without the `tesseract` feature; OCR requests will fail");
    Arc::new(gagyebu_ocr::UnavailableRecognizer)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
