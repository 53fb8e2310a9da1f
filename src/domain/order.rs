//! Order references embedded in transfer descriptions.

use regex::Regex;

use crate::error::{Error, Result};

/// Default order reference prefix.
pub const DEFAULT_ORDER_PREFIX: &str = "GH";

/// Default number of digits after the prefix.
pub const DEFAULT_ORDER_DIGITS: usize = 6;

/// Matches an order reference such as `GH123456` inside free text.
///
/// The reference must start the description or follow whitespace, `.`, `,`
/// or `-`, and must be exactly the configured number of digits long.
#[derive(Debug, Clone)]
pub struct OrderReferencePattern {
    regex: Regex,
}

impl OrderReferencePattern {
    /// Build a pattern for `prefix` followed by `digits` digits.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the prefix produces an invalid expression or
    /// `digits` is zero.
    pub fn new(prefix: &str, digits: usize) -> Result<Self> {
        if digits == 0 {
            return Err(Error::Parse("order reference needs at least one digit".into()));
        }
        let pattern = format!(
            r"(?:^|[\s.,\-])({}\d{{{}}})(?:\D|$)",
            regex::escape(prefix),
            digits
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::Parse(format!("invalid order reference pattern: {e}")))?;
        Ok(Self { regex })
    }

    /// First order reference in `description`, if any.
    #[must_use]
    pub fn detect<'a>(&self, description: &'a str) -> Option<&'a str> {
        self.regex
            .captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
