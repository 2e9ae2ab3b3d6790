use chrono::{Datelike, Utc};

use crate::types::ExtractedReceipt;

pub use amount::{amount_candidates, extract_amount, AmountLabel, AMOUNT_LABELS};
pub use date::{
    expand_two_digit_year, extract_date, extract_date_with_reference, DateFamily, DATE_FAMILIES,
};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

mod amount;
mod date;

/// OCR output is used as-is; the engine is trusted to hand back plain text.
pub fn normalize_text(raw: &str) -> &str {
    raw
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract the total and transaction date from raw OCR text, resolving
    /// two-digit years against the current calendar year.
    pub fn extract(ocr_text: &str) -> ExtractedReceipt {
        Self::extract_with_reference_year(ocr_text, Utc::now().year())
    }

    pub fn extract_with_reference_year(ocr_text: &str, current_year: i32) -> ExtractedReceipt {
        let text = normalize_text(ocr_text);
        ExtractedReceipt {
            amount: extract_amount(text),
            date: extract_date_with_reference(text, current_year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gagyebu_core::Won;

    #[test]
    fn normalize_is_identity() {
        let raw = "  이마트\n합계 12000 \n";
        assert_eq!(normalize_text(raw), raw);
    }

    #[test]
    fn emart_receipt_end_to_end() {
        let text = "이마트 2024.03.15 금액: 12,000원 합계 12000";
        let r = Extractor::extract(text);
        assert_eq!(r.amount, Some(Won::new(12000)));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn multi_line_receipt() {
        let text = "GS25 역삼점\n\
                    2024년 3월 5일 14:22\n\
                    삼각김밥        1,500원\n\
                    바나나우유      1,700원\n\
                    합계: 3,200\n\
                    카드승인 3,200원";
        let r = Extractor::extract(text);
        assert_eq!(r.amount, Some(Won::new(3200)));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(Extractor::extract(""), ExtractedReceipt::default());
    }

    #[test]
    fn partial_result_when_only_amount_present() {
        let r = Extractor::extract("TOTAL 8,900");
        assert_eq!(r.amount, Some(Won::new(8900)));
        assert_eq!(r.date, None);
    }

    #[test]
    fn two_digit_year_uses_reference_century() {
        let r = Extractor::extract_with_reference_year("24-03-20 5,000원", 2031);
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 20));
        let r = Extractor::extract_with_reference_year("24-03-20", 2150);
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2124, 3, 20));
    }

    #[test]
    fn deterministic() {
        let text = "합계 15,000 TOTAL 15000 2024-01-15";
        assert_eq!(Extractor::extract(text), Extractor::extract(text));
    }

    #[test]
    fn no_panic_on_garbage_input() {
        let _ = Extractor::extract("!@#$%^&*()\n\0\x01\x02 원원 년월일 ..--");
    }
}
