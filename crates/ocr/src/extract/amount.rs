use gagyebu_core::Won;
use regex::Regex;

// A figure is either comma-grouped (`1,234,567`) or a bare digit run (`12000`).
// Grouped comes first so `12,000` is not cut short at the comma.
re!(re_won_suffix, r"(\d{1,3}(?:,\d{3})+|\d+)\s*원");
re!(re_amount_label, r"금액[:\s]*(\d{1,3}(?:,\d{3})+|\d+)");
re!(re_sum_label, r"합계[:\s]*(\d{1,3}(?:,\d{3})+|\d+)");
re!(re_total_label, r"(?i)total[:\s]*(\d{1,3}(?:,\d{3})+|\d+)");

/// Where an amount candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountLabel {
    /// `12,300원`
    WonSuffix,
    /// `금액: 12,300`
    Amount,
    /// `합계 12,300`
    Sum,
    /// `Total 12,300`
    Total,
}

pub const AMOUNT_LABELS: &[AmountLabel] = &[
    AmountLabel::WonSuffix,
    AmountLabel::Amount,
    AmountLabel::Sum,
    AmountLabel::Total,
];

impl AmountLabel {
    fn pattern(self) -> &'static Regex {
        match self {
            AmountLabel::WonSuffix => re_won_suffix(),
            AmountLabel::Amount => re_amount_label(),
            AmountLabel::Sum => re_sum_label(),
            AmountLabel::Total => re_total_label(),
        }
    }

    /// Every positive figure this label matches, in document order.
    pub fn candidates(self, text: &str) -> Vec<Won> {
        self.pattern()
            .captures_iter(text)
            .filter_map(|c| Won::parse_grouped(c.get(1)?.as_str()))
            .collect()
    }
}

/// All candidates from all label families, in family order.
pub fn amount_candidates(text: &str) -> Vec<Won> {
    AMOUNT_LABELS
        .iter()
        .flat_map(|label| label.candidates(text))
        .collect()
}

/// The largest candidate wins: receipts list subtotals and line items before
/// the total, and the total is the biggest amount-like figure on the page.
pub fn extract_amount(text: &str) -> Option<Won> {
    amount_candidates(text).into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn won(n: i64) -> Option<Won> {
        Some(Won::new(n))
    }

    #[test]
    fn won_suffix_with_grouping() {
        assert_eq!(extract_amount("아메리카노 4,500원"), won(4500));
        assert_eq!(extract_amount("4500 원"), won(4500));
    }

    #[test]
    fn plain_digits_are_not_truncated() {
        assert_eq!(extract_amount("12000원"), won(12000));
        assert_eq!(extract_amount("합계 12000"), won(12000));
    }

    #[test]
    fn labels_with_colon_and_space() {
        assert_eq!(extract_amount("금액: 7,000"), won(7000));
        assert_eq!(extract_amount("합계:9,900"), won(9900));
        assert_eq!(extract_amount("Total: 1,234,567"), won(1_234_567));
    }

    #[test]
    fn total_is_case_insensitive() {
        assert_eq!(extract_amount("TOTAL 3000"), won(3000));
        assert_eq!(extract_amount("total 3000"), won(3000));
        assert_eq!(extract_amount("Grand ToTaL 3000"), won(3000));
    }

    #[test]
    fn maximum_across_families_wins() {
        assert_eq!(extract_amount("15,000원\n합계: 32,000"), won(32000));
    }

    #[test]
    fn maximum_within_one_family() {
        assert_eq!(extract_amount("1,000원 2,500원 800원"), won(2500));
    }

    #[test]
    fn repeated_total_is_not_over_counted() {
        let text = "금액 12,000원\n합계 12,000원\nTOTAL 12,000";
        assert_eq!(extract_amount(text), won(12000));
        assert!(amount_candidates(text).iter().all(|w| *w == Won::new(12000)));
    }

    #[test]
    fn no_digits_means_absent_not_zero() {
        assert_eq!(extract_amount("원 없음"), None);
        assert_eq!(extract_amount(""), None);
        assert_eq!(extract_amount("합계: 원"), None);
    }

    #[test]
    fn zero_is_discarded() {
        assert_eq!(extract_amount("0원"), None);
        assert_eq!(extract_amount("할인 0원 합계 5,000"), won(5000));
    }

    #[test]
    fn unlabelled_numbers_are_ignored() {
        assert_eq!(extract_amount("사업자번호 123-45-67890 전화 02 1234 5678"), None);
    }

    #[test]
    fn candidates_per_label() {
        let text = "금액 1,000 합계 2,000 total 3,000 4,000원";
        assert_eq!(AmountLabel::Amount.candidates(text), vec![Won::new(1000)]);
        assert_eq!(AmountLabel::Sum.candidates(text), vec![Won::new(2000)]);
        assert_eq!(AmountLabel::Total.candidates(text), vec![Won::new(3000)]);
        assert_eq!(AmountLabel::WonSuffix.candidates(text), vec![Won::new(4000)]);
        assert_eq!(extract_amount(text), won(4000));
    }

    #[test]
    fn deterministic() {
        let text = "이마트 금액: 12,000원 합계 12000";
        assert_eq!(extract_amount(text), extract_amount(text));
    }
}
