//! Scripted transaction fetcher.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;

use crate::domain::{AccountSnapshot, Transaction};
use crate::port::{FetchResult, SessionId, TransactionFetcher};

/// One recorded `fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub session: SessionId,
    pub from: NaiveDateTime,
    pub max_pages: u32,
}

/// A [`TransactionFetcher`] that replays queued results.
///
/// Returns an empty success once the queue runs dry.
#[derive(Default)]
pub struct ScriptedFetcher {
    results: Mutex<VecDeque<FetchResult>>,
    calls: Mutex<Vec<FetchCall>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: FetchResult) {
        self.results.lock().push_back(result);
    }

    pub fn push_transactions(&self, transactions: Vec<Transaction>) {
        self.push(FetchResult::success(
            transactions,
            AccountSnapshot::default(),
        ));
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    /// Highest number of overlapping `fetch` calls observed.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        session: &SessionId,
        from: NaiveDateTime,
        max_pages: u32,
    ) -> FetchResult {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.calls.lock().push(FetchCall {
            session: session.clone(),
            from,
            max_pages,
        });
        tokio::task::yield_now().await;
        let result = self
            .results
            .lock()
            .pop_front()
            .unwrap_or_else(|| FetchResult::success(Vec::new(), AccountSnapshot::default()));
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
