//! Transaction validity policy.
//!
//! Which rows count as real transactions is a tunable heuristic, not a fixed
//! rule. A transaction rejected here is never compared, never forwarded.

use rust_decimal::Decimal;

use super::transaction::Transaction;

/// Default minimum reference length.
pub const DEFAULT_MIN_REFERENCE_LEN: usize = 5;

/// Decides whether a transaction is well-formed enough to deduplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePolicy {
    /// Shortest acceptable reference after trimming.
    pub min_reference_len: usize,
    /// Also require a counterparty name or a non-zero amount.
    pub require_counterparty_or_amount: bool,
}

impl Default for ReferencePolicy {
    fn default() -> Self {
        Self {
            min_reference_len: DEFAULT_MIN_REFERENCE_LEN,
            require_counterparty_or_amount: false,
        }
    }
}

impl ReferencePolicy {
    /// True when the reference alone is usable as a dedup key.
    #[must_use]
    pub fn accepts_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        reference.len() >= self.min_reference_len.max(1)
            && reference.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// True when the transaction may take part in deduplication.
    #[must_use]
    pub fn accepts(&self, tx: &Transaction) -> bool {
        if !self.accepts_reference(&tx.reference) {
            return false;
        }
        if self.require_counterparty_or_amount {
            return !tx.counterparty.trim().is_empty() || tx.amount != Decimal::ZERO;
        }
        true
    }
}
