//! Transaction fetcher port.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::{AccountSnapshot, Transaction};

use super::portal::SessionId;

/// Fetch outcome kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    /// The session was found logged out; route to recovery, not retry.
    SessionExpired,
    Error,
}

/// Result of one fetch against the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: FetchStatus,
    pub transactions: Vec<Transaction>,
    pub account: AccountSnapshot,
    pub message: String,
}

impl FetchResult {
    #[must_use]
    pub fn success(transactions: Vec<Transaction>, account: AccountSnapshot) -> Self {
        Self {
            status: FetchStatus::Success,
            transactions,
            account,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::failed(FetchStatus::SessionExpired, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::failed(FetchStatus::Error, message)
    }

    fn failed(status: FetchStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            transactions: Vec::new(),
            account: AccountSnapshot::default(),
            message: message.into(),
        }
    }
}

/// Reads posted transactions from an authenticated session.
///
/// Calls with the same `from` never drop a transaction an earlier call
/// returned; the result is a superset unless the portal itself changed.
/// Failures are reported through [`FetchStatus`], not as errors.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    async fn fetch(&self, session: &SessionId, from: NaiveDateTime, max_pages: u32)
        -> FetchResult;
}
