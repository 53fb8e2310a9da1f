//! Fetch batches: one immutable snapshot per fetch cycle.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// How the fetch that produced a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Fetch succeeded and returned transactions.
    Success,
    /// Fetch succeeded with an empty window.
    NoTransactions,
    /// The portal session had expired; the batch is only a marker.
    SessionExpired,
    /// The fetch failed; the batch is only a marker.
    Error,
}

impl BatchStatus {
    /// True when the batch reflects what the portal actually reported.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Success | Self::NoTransactions)
    }
}

/// Account details captured alongside a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// A persisted fetch result.
///
/// Batches are append-only; nothing mutates one after it is recorded.
/// `sequence` orders batches independently of file timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBatch {
    pub sequence: u64,
    /// Business-local time the fetch ran.
    pub fetched_at: NaiveDateTime,
    /// Watermark the fetch asked the portal for.
    pub window_start: NaiveDateTime,
    pub timezone: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub account: AccountSnapshot,
    #[serde(default)]
    pub message: Option<String>,
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

impl FetchBatch {
    /// Latest `posted_at` across the batch's transactions.
    ///
    /// Rows without a readable time are left out.
    #[must_use]
    pub fn latest_posted_at(&self) -> Option<NaiveDateTime> {
        self.transactions.iter().filter_map(|tx| tx.posted_at).max()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// A batch that has not been assigned a sequence yet.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub fetched_at: NaiveDateTime,
    pub window_start: NaiveDateTime,
    pub status: BatchStatus,
    pub account: AccountSnapshot,
    pub message: Option<String>,
    pub transactions: Vec<Transaction>,
}

impl NewBatch {
    /// A batch built from a successful fetch.
    ///
    /// The status becomes [`BatchStatus::NoTransactions`] for an empty window.
    #[must_use]
    pub fn fetched(
        fetched_at: NaiveDateTime,
        window_start: NaiveDateTime,
        account: AccountSnapshot,
        transactions: Vec<Transaction>,
    ) -> Self {
        let status = if transactions.is_empty() {
            BatchStatus::NoTransactions
        } else {
            BatchStatus::Success
        };
        Self {
            fetched_at,
            window_start,
            status,
            account,
            message: None,
            transactions,
        }
    }

    /// A marker for a fetch that did not complete.
    #[must_use]
    pub fn failed(
        fetched_at: NaiveDateTime,
        window_start: NaiveDateTime,
        status: BatchStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            fetched_at,
            window_start,
            status,
            account: AccountSnapshot::default(),
            message: Some(message.into()),
            transactions: Vec::new(),
        }
    }

    /// Freeze into a persisted batch.
    #[must_use]
    pub fn into_batch(self, sequence: u64, timezone: &str) -> FetchBatch {
        FetchBatch {
            sequence,
            fetched_at: self.fetched_at,
            window_start: self.window_start,
            timezone: timezone.to_string(),
            status: self.status,
            account: self.account,
            message: self.message,
            count: self.transactions.len(),
            transactions: self.transactions,
        }
    }
}
