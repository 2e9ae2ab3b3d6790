//! HTTP service for receipt upload and OCR.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.storage.max_upload_bytes;
    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::receipts::router(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
