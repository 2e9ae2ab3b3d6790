use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in Korean won. The won has no minor unit in circulation, so the
/// inner value is already the smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Won(i64);

impl Won {
    pub fn new(amount: i64) -> Self {
        Won(amount)
    }

    pub fn amount(self) -> i64 {
        self.0
    }

    /// Parse a figure such as `12,300` or `12300`. Thousands separators are
    /// stripped; anything else that is not a digit makes the parse fail.
    /// Zero is rejected: a receipt never prints a zero total on purpose, and an
    /// absent amount must not be confused with `0원`.
    pub fn parse_grouped(s: &str) -> Option<Won> {
        let digits: String = s.chars().filter(|c| *c != ',').collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: i64 = digits.parse().ok()?;
        (value > 0).then_some(Won(value))
    }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            write!(f, "-{grouped}원")
        } else {
            write!(f, "{grouped}원")
        }
    }
}
