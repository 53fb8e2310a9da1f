//! Bank transactions as reported by the portal.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money flow direction relative to the watched account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
        }
    }
}

/// A single posted transaction.
///
/// `reference` is the dedup key. `posted_at` is civil time in the business
/// timezone; it carries no offset of its own and is `None` when the portal
/// showed a time that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub direction: Direction,
    pub amount: Decimal,
    #[serde(default)]
    pub posted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub counterparty: String,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    /// The reference with surrounding whitespace removed.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.reference.trim()
    }

    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self.direction, Direction::Credit)
    }
}

/// Parse a portal amount such as `"1,250,000"`, `"1.250.000 VND"` or
/// `"1,234.50"`.
///
/// `,` always groups. A final `.` followed by one or two digits starts the
/// fraction; followed by three digits it groups. Anything else after the
/// final `.` is rejected. A blank value reads as zero.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return raw.trim().is_empty().then_some(Decimal::ZERO);
    }

    let (negative, body) = match kept.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, kept.as_str()),
    };
    if body.contains('-') {
        return None;
    }

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let (int_part, fraction) = match body.rsplit_once('.') {
        Some((int, frac)) if (1..=2).contains(&frac.len()) && all_digits(frac) => (int, Some(frac)),
        Some((_, frac)) if frac.len() == 3 && all_digits(frac) => (body, None),
        Some(_) => return None,
        None => (body, None),
    };

    let mut digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        digits.push('0');
    }
    if let Some(frac) = fraction {
        digits.push('.');
        digits.push_str(frac);
    }
    let value: Decimal = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
