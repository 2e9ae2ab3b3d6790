//! Receipt endpoints.
//!
//! - POST   /api/receipts          multipart upload
//! - GET    /api/receipts          list (optional `linkedTxId`, `status`)
//! - GET    /api/receipts/{id}     fetch one
//! - PATCH  /api/receipts/{id}     manual OCR correction
//! - DELETE /api/receipts/{id}     remove record and file
//! - POST   /api/receipts/{id}/ocr run OCR once

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use gagyebu_core::{OcrStatus, ReceiptId, ReceiptRecord};
use gagyebu_ocr::resolve_under;
use gagyebu_storage::{self as db, NewReceipt, OcrCorrection};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::auth::Caller;
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub const ALLOWED_MIME_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/jpg", "application/pdf"];

/// Room for multipart boundaries and the text fields around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/receipts",
            get(list).post(upload).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/api/receipts/{id}", get(get_one).patch(correct).delete(remove))
        .route("/api/receipts/{id}/ocr", post(run_ocr))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "linkedTxId")]
    pub linked_tx_id: Option<String>,
    /// `processed` or `unprocessed`.
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

struct UploadedFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

/// Keep the final path segment and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "receipt".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<millis>-<uuid>-<sanitized name>`; unique even for same-named uploads
/// landing in the same millisecond.
fn stored_file_name(sanitized: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        sanitized
    )
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(limit)
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

async fn read_file_field(field: Field<'_>, limit: usize) -> Result<UploadedFile> {
    let name = field.file_name().map(sanitize_filename).unwrap_or_else(|| "receipt".to_string());
    let mime = field.content_type().unwrap_or_default().to_ascii_lowercase();
    let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
    if bytes.len() > limit {
        return Err(ApiError::PayloadTooLarge(limit));
    }
    Ok(UploadedFile { name, mime, bytes: bytes.to_vec() })
}

/// POST /api/receipts
async fn upload(
    State(state): State<AppState>,
    caller: Caller,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReceiptRecord>)> {
    let user = caller.require()?;
    let limit = state.storage.max_upload_bytes;

    let mut file = None;
    let mut linked_tx_id = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => file = Some(read_file_field(field, limit).await?),
            Some("linkedTxId") => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                linked_tx_id = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;
    if !ALLOWED_MIME_TYPES.contains(&file.mime.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "unsupported file type '{}' (png, jpeg, pdf only)",
            file.mime
        )));
    }

    let stored_name = stored_file_name(&file.name);
    let dir = &state.storage.upload_dir;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&stored_name);
    let mut out = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    out.write_all(&file.bytes).await?;
    out.flush().await?;

    let new = NewReceipt {
        user_id: user,
        url: format!("{}{}", state.storage.url_prefix, stored_name),
        mime: file.mime,
        size: file.bytes.len() as i64,
        linked_tx_id,
    };
    let receipt = match db::insert_receipt(&state.pool, &new).await {
        Ok(receipt) => receipt,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), "Failed to remove orphaned upload: {rm}");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        receipt_id = %receipt.id,
        mime = %receipt.mime,
        size = receipt.size,
        "Receipt uploaded"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/receipts
async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ReceiptRecord>>> {
    let user = caller.require()?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OcrStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let linked = query.linked_tx_id.as_deref().filter(|t| !t.is_empty());

    let mut receipts = db::list_receipts(&state.pool, &user, linked).await?;
    if let Some(status) = status {
        receipts.retain(|r| r.ocr_status() == status);
    }
    Ok(Json(receipts))
}

/// GET /api/receipts/{id}
async fn get_one(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ReceiptRecord>> {
    let user = caller.require()?;
    db::get_receipt_for_owner(&state.pool, &user, &ReceiptId::new(id.clone()))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// PATCH /api/receipts/{id}
async fn correct(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    Json(correction): Json<OcrCorrection>,
) -> Result<Json<ReceiptRecord>> {
    let user = caller.require()?;
    let updated =
        db::correct_ocr_fields(&state.pool, &user, &ReceiptId::new(id.clone()), &correction)
            .await?
            .ok_or(ApiError::NotFound(id))?;
    tracing::info!(receipt_id = %updated.id, "OCR fields corrected");
    Ok(Json(updated))
}

/// DELETE /api/receipts/{id}
///
/// The record goes first. The stored file is then removed on a best-effort
/// basis, and only when its url resolves inside the upload directory.
async fn remove(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let user = caller.require()?;
    let id = ReceiptId::new(id);
    let receipt = db::get_receipt_for_owner(&state.pool, &user, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

    if !db::delete_receipt(&state.pool, &user, &id).await? {
        return Err(ApiError::NotFound(id.to_string()));
    }

    match resolve_under(&state.storage.upload_dir, &state.storage.url_prefix, &receipt.url) {
        Ok(path) => {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(receipt_id = %id, path = %path.display(), "Failed to remove receipt file: {e}");
            }
        }
        Err(_) => {
            tracing::warn!(receipt_id = %id, url = %receipt.url, "Receipt url outside upload root; file left in place");
        }
    }

    tracing::info!(receipt_id = %id, "Receipt deleted");
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /api/receipts/{id}/ocr
async fn run_ocr(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ReceiptRecord>> {
    let record = state.processor.process(caller.0.as_ref(), &ReceiptId::new(id)).await?;
    Ok(Json(record))
}
