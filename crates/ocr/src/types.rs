use chrono::NaiveDate;
use gagyebu_core::Won;
use serde::{Deserialize, Serialize};

/// Tesseract language hint for mixed Korean/English receipts.
pub const KOREAN_ENGLISH: &str = "kor+eng";

/// What an OCR backend hands back for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOcrResult {
    pub text: String,
    /// Engine confidence on its native 0–100 scale.
    pub confidence: f32,
}

impl RawOcrResult {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { text: text.into(), confidence }
    }

    /// Confidence as a 0.0–1.0 fraction.
    pub fn confidence_fraction(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        (f64::from(self.confidence) / 100.0).clamp(0.0, 1.0)
    }
}

/// Structured fields pulled out of OCR text. Either may be absent; absence is
/// a valid outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    pub amount: Option<Won>,
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_fraction_scales_and_clamps() {
        assert_eq!(RawOcrResult::new("", 87.0).confidence_fraction(), 0.87);
        assert_eq!(RawOcrResult::new("", 0.0).confidence_fraction(), 0.0);
        assert_eq!(RawOcrResult::new("", 130.0).confidence_fraction(), 1.0);
        assert_eq!(RawOcrResult::new("", -4.0).confidence_fraction(), 0.0);
        assert_eq!(RawOcrResult::new("", f32::NAN).confidence_fraction(), 0.0);
    }
}
