use chrono::{DateTime, NaiveDate, Utc};
use gagyebu_core::{OcrFields, ReceiptId, ReceiptRecord, UserId, Won};
use serde::{Deserialize, Deserializer};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS receipts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            url TEXT NOT NULL,
            mime TEXT NOT NULL,
            size INTEGER NOT NULL,
            linked_tx_id TEXT,
            ocr_text TEXT,
            ocr_amount INTEGER,
            ocr_date TEXT,
            ocr_confidence REAL,
            uploaded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_receipts_user_uploaded ON receipts (user_id, uploaded_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

const RECEIPT_COLUMNS: &str = "id, user_id, url, mime, size, linked_tx_id, \
     ocr_text, ocr_amount, ocr_date, ocr_confidence, uploaded_at";

type ReceiptRow = (
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<NaiveDate>,
    Option<f64>,
    DateTime<Utc>,
);

fn receipt_from_row(r: ReceiptRow) -> ReceiptRecord {
    ReceiptRecord {
        id: ReceiptId(r.0),
        user_id: UserId(r.1),
        url: r.2,
        mime: r.3,
        size: r.4,
        linked_tx_id: r.5,
        ocr_text: r.6,
        ocr_amount: r.7.map(Won::new),
        ocr_date: r.8,
        ocr_confidence: r.9,
        uploaded_at: r.10,
    }
}

/// A freshly uploaded receipt; OCR fields start out empty.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub user_id: UserId,
    pub url: String,
    pub mime: String,
    pub size: i64,
    pub linked_tx_id: Option<String>,
}

/// A manual edit of OCR output. An absent key leaves the stored value as it
/// is; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrCorrection {
    #[serde(default, deserialize_with = "present")]
    pub ocr_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub ocr_amount: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub ocr_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub ocr_confidence: Option<Option<f64>>,
}

/// Only called for keys that appear in the input, so `null` becomes
/// `Some(None)` while a missing key keeps the `None` default.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub async fn insert_receipt(pool: &DbPool, new: &NewReceipt) -> Result<ReceiptRecord, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let row = sqlx::query_as::<_, ReceiptRow>(&format!(
        "INSERT INTO receipts (id, user_id, url, mime, size, linked_tx_id, uploaded_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {RECEIPT_COLUMNS}"
    ))
    .bind(&id)
    .bind(new.user_id.as_str())
    .bind(&new.url)
    .bind(&new.mime)
    .bind(new.size)
    .bind(&new.linked_tx_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(receipt_from_row(row))
}

pub async fn get_receipt_for_owner(
    pool: &DbPool,
    owner: &UserId,
    id: &ReceiptId,
) -> Result<Option<ReceiptRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReceiptRow>(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ? AND user_id = ?"
    ))
    .bind(id.as_str())
    .bind(owner.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(receipt_from_row))
}

/// Newest first. `linked_tx_id` narrows to receipts attached to one transaction.
pub async fn list_receipts(
    pool: &DbPool,
    owner: &UserId,
    linked_tx_id: Option<&str>,
) -> Result<Vec<ReceiptRecord>, sqlx::Error> {
    let rows = match linked_tx_id {
        Some(tx) => {
            sqlx::query_as::<_, ReceiptRow>(&format!(
                "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE user_id = ? AND linked_tx_id = ? \
                 ORDER BY uploaded_at DESC, id DESC"
            ))
            .bind(owner.as_str())
            .bind(tx)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ReceiptRow>(&format!(
                "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE user_id = ? \
                 ORDER BY uploaded_at DESC, id DESC"
            ))
            .bind(owner.as_str())
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(receipt_from_row).collect())
}

/// Write all four OCR fields in a single statement, but only while the
/// receipt has no OCR text yet. `None` means nothing was written.
pub async fn record_ocr_if_unprocessed(
    pool: &DbPool,
    id: &ReceiptId,
    fields: &OcrFields,
) -> Result<Option<ReceiptRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReceiptRow>(&format!(
        "UPDATE receipts SET ocr_text = ?, ocr_amount = ?, ocr_date = ?, ocr_confidence = ? \
         WHERE id = ? AND (ocr_text IS NULL OR ocr_text = '') \
         RETURNING {RECEIPT_COLUMNS}"
    ))
    .bind(&fields.ocr_text)
    .bind(fields.ocr_amount.map(Won::amount))
    .bind(fields.ocr_date)
    .bind(fields.ocr_confidence)
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(receipt_from_row))
}

pub async fn correct_ocr_fields(
    pool: &DbPool,
    owner: &UserId,
    id: &ReceiptId,
    correction: &OcrCorrection,
) -> Result<Option<ReceiptRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReceiptRow>(&format!(
        "UPDATE receipts SET \
             ocr_text = CASE WHEN ? THEN ? ELSE ocr_text END, \
             ocr_amount = CASE WHEN ? THEN ? ELSE ocr_amount END, \
             ocr_date = CASE WHEN ? THEN ? ELSE ocr_date END, \
             ocr_confidence = CASE WHEN ? THEN ? ELSE ocr_confidence END \
         WHERE id = ? AND user_id = ? \
         RETURNING {RECEIPT_COLUMNS}"
    ))
    .bind(correction.ocr_text.is_some())
    .bind(correction.ocr_text.clone().flatten())
    .bind(correction.ocr_amount.is_some())
    .bind(correction.ocr_amount.flatten())
    .bind(correction.ocr_date.is_some())
    .bind(correction.ocr_date.flatten())
    .bind(correction.ocr_confidence.is_some())
    .bind(correction.ocr_confidence.flatten())
    .bind(id.as_str())
    .bind(owner.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(receipt_from_row))
}

/// Returns whether a row was deleted.
pub async fn delete_receipt(
    pool: &DbPool,
    owner: &UserId,
    id: &ReceiptId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM receipts WHERE id = ? AND user_id = ?")
        .bind(id.as_str())
        .bind(owner.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
