use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Won;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub String);

impl ReceiptId {
    pub fn new(id: impl Into<String>) -> Self {
        ReceiptId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an authenticated caller, as resolved by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed from the `status` filter of a receipt listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrStatus {
    Unprocessed,
    Processed,
}

impl std::str::FromStr for OcrStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unprocessed" => Ok(OcrStatus::Unprocessed),
            "processed" => Ok(OcrStatus::Processed),
            other => Err(format!("Unknown OCR status: '{other}'")),
        }
    }
}

/// The four OCR-derived fields. They are always written together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrFields {
    pub ocr_text: String,
    pub ocr_amount: Option<Won>,
    pub ocr_date: Option<NaiveDate>,
    /// Recognition confidence as a fraction (0.0–1.0).
    pub ocr_confidence: f64,
}

/// An uploaded receipt and whatever OCR has derived from it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    pub id: ReceiptId,
    pub user_id: UserId,
    /// Stored path relative to the public root, e.g. `/uploads/receipts/1700000000000-a.png`.
    pub url: String,
    pub mime: String,
    pub size: i64,
    pub linked_tx_id: Option<String>,
    pub ocr_text: Option<String>,
    pub ocr_amount: Option<Won>,
    pub ocr_date: Option<NaiveDate>,
    pub ocr_confidence: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

impl ReceiptRecord {
    /// A receipt counts as processed once it carries non-empty OCR text.
    pub fn is_processed(&self) -> bool {
        self.ocr_text.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn ocr_status(&self) -> OcrStatus {
        if self.is_processed() {
            OcrStatus::Processed
        } else {
            OcrStatus::Unprocessed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> ReceiptRecord {
        ReceiptRecord {
            id: ReceiptId::new("r1"),
            user_id: UserId::new("u1"),
            url: "/uploads/receipts/a.png".into(),
            mime: "image/png".into(),
            size: 10,
            linked_tx_id: None,
            ocr_text: None,
            ocr_amount: None,
            ocr_date: None,
            ocr_confidence: None,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn empty_text_is_not_processed() {
        let mut r = blank();
        assert!(!r.is_processed());
        r.ocr_text = Some(String::new());
        assert!(!r.is_processed());
        assert_eq!(r.ocr_status(), OcrStatus::Unprocessed);
    }

    #[test]
    fn non_empty_text_is_processed() {
        let r = ReceiptRecord {
            ocr_text: Some("이마트".into()),
            ocr_amount: Some(Won::new(12000)),
            ocr_confidence: Some(0.87),
            ..blank()
        };
        assert!(r.is_processed());
        assert_eq!(r.ocr_status(), OcrStatus::Processed);
    }

    #[test]
    fn ocr_status_parses_filter_values() {
        assert_eq!("processed".parse::<OcrStatus>().unwrap(), OcrStatus::Processed);
        assert_eq!("unprocessed".parse::<OcrStatus>().unwrap(), OcrStatus::Unprocessed);
        assert!("done".parse::<OcrStatus>().is_err());
    }

    #[test]
    fn record_serializes_camel_case() {
        let r = ReceiptRecord {
            ocr_text: Some("x".into()),
            ocr_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            ..blank()
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["ocrText"], "x");
        assert_eq!(json["ocrDate"], "2024-03-15");
        assert_eq!(json["userId"], "u1");
        assert!(json["ocrAmount"].is_null());
    }
}
