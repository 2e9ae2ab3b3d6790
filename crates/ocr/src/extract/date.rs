use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;

re!(re_date_numeric_long, r"(\d{4})[.-](\d{1,2})[.-](\d{1,2})");
re!(re_date_korean, r"(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일");
re!(re_date_numeric_short, r"(\d{2})[.-](\d{1,2})[.-](\d{1,2})");

/// One way of writing a date on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFamily {
    /// `2024-01-15`, `2024.1.5`
    NumericLongYear,
    /// `2024년 01월 15일`
    Korean,
    /// `24-01-15`, `24.1.5`
    NumericShortYear,
}

/// Families in priority order. The first one that produces a real calendar
/// day decides the result.
pub const DATE_FAMILIES: &[DateFamily] = &[
    DateFamily::NumericLongYear,
    DateFamily::Korean,
    DateFamily::NumericShortYear,
];

impl DateFamily {
    fn pattern(self) -> &'static Regex {
        match self {
            DateFamily::NumericLongYear => re_date_numeric_long(),
            DateFamily::Korean => re_date_korean(),
            DateFamily::NumericShortYear => re_date_numeric_short(),
        }
    }

    /// Only the first match in document order is considered. If it is not a
    /// real day the family yields nothing; later matches are not scanned.
    pub fn first_date(self, text: &str, current_year: i32) -> Option<NaiveDate> {
        let c = self.pattern().captures(text)?;
        let year: i32 = c.get(1)?.as_str().parse().ok()?;
        let month: u32 = c.get(2)?.as_str().parse().ok()?;
        let day: u32 = c.get(3)?.as_str().parse().ok()?;
        let year = match self {
            DateFamily::NumericShortYear => expand_two_digit_year(year, current_year),
            DateFamily::NumericLongYear | DateFamily::Korean => year,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// Place a two-digit year in the same century as `current_year`.
/// `24` read in 2026 becomes 2024; read in 2101 it becomes 2124.
pub fn expand_two_digit_year(yy: i32, current_year: i32) -> i32 {
    (current_year / 100) * 100 + yy
}

pub fn extract_date(text: &str) -> Option<NaiveDate> {
    extract_date_with_reference(text, Utc::now().year())
}

pub fn extract_date_with_reference(text: &str, current_year: i32) -> Option<NaiveDate> {
    DATE_FAMILIES
        .iter()
        .find_map(|family| family.first_date(text, current_year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn long_year_with_dash_and_dot() {
        assert_eq!(extract_date_with_reference("2024-01-15", 2026), ymd(2024, 1, 15));
        assert_eq!(extract_date_with_reference("거래일 2024.03.15 10:21", 2026), ymd(2024, 3, 15));
    }

    #[test]
    fn single_digit_month_and_day_are_padded() {
        let d = extract_date_with_reference("2024.3.5", 2026).unwrap();
        assert_eq!(d.to_string(), "2024-03-05");
    }

    #[test]
    fn korean_units() {
        assert_eq!(extract_date_with_reference("2024년 01월 15일", 2026), ymd(2024, 1, 15));
        assert_eq!(extract_date_with_reference("2024년3월5일", 2026), ymd(2024, 3, 5));
    }

    #[test]
    fn two_digit_year_expands_to_current_century() {
        assert_eq!(extract_date_with_reference("24-03-20", 2026), ymd(2024, 3, 20));
        assert_eq!(extract_date_with_reference("24.03.20", 2099), ymd(2024, 3, 20));
    }

    #[test]
    fn long_year_beats_short_year_regardless_of_position() {
        let text = "24.03.20 영수증\n2024-01-15";
        assert_eq!(extract_date_with_reference(text, 2026), ymd(2024, 1, 15));
    }

    #[test]
    fn long_year_beats_korean() {
        let text = "2023년 12월 1일\n2024-01-15";
        assert_eq!(extract_date_with_reference(text, 2026), ymd(2024, 1, 15));
    }

    #[test]
    fn first_match_within_family_wins() {
        let text = "2024-01-15 ~ 2024-02-20";
        assert_eq!(extract_date_with_reference(text, 2026), ymd(2024, 1, 15));
    }

    #[test]
    fn impossible_date_is_rejected() {
        assert_eq!(extract_date_with_reference("2024-13-40", 2026), None);
        assert_eq!(extract_date_with_reference("2023-02-29", 2026), None);
        assert_eq!(extract_date_with_reference("2024년 2월 30일", 2026), None);
    }

    #[test]
    fn leap_day_is_accepted() {
        assert_eq!(extract_date_with_reference("2024-02-29", 2026), ymd(2024, 2, 29));
    }

    #[test]
    fn invalid_family_falls_through_to_next() {
        let text = "2024-13-40\n2024년 3월 1일";
        assert_eq!(extract_date_with_reference(text, 2026), ymd(2024, 3, 1));
    }

    #[test]
    fn invalid_first_match_does_not_scan_later_matches_in_family() {
        let text = "2024-13-40 2024-03-01";
        assert_eq!(DateFamily::NumericLongYear.first_date(text, 2026), None);
    }

    #[test]
    fn no_date_is_absent() {
        assert_eq!(extract_date_with_reference("합계 12,000원", 2026), None);
        assert_eq!(extract_date_with_reference("", 2026), None);
    }

    #[test]
    fn expand_two_digit_year_policy() {
        assert_eq!(expand_two_digit_year(24, 2026), 2024);
        assert_eq!(expand_two_digit_year(99, 2026), 2099);
        assert_eq!(expand_two_digit_year(0, 2026), 2000);
        assert_eq!(expand_two_digit_year(5, 2130), 2105);
    }

    #[test]
    fn families_are_ordered() {
        assert_eq!(
            DATE_FAMILIES,
            &[
                DateFamily::NumericLongYear,
                DateFamily::Korean,
                DateFamily::NumericShortYear
            ]
        );
    }

    #[test]
    fn extract_date_uses_clock() {
        assert_eq!(extract_date("2024-01-15"), ymd(2024, 1, 15));
    }
}
