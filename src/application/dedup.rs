//! Batch history, watermark and new-transaction detection.
//!
//! Every fetch cycle appends one batch. The newest batch is compared against
//! everything older that is still retained; after the new transactions are
//! forwarded, older batches are pruned.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::domain::{BusinessTime, FetchBatch, NewBatch, ReferencePolicy, Transaction};
use crate::error::Result;
use crate::port::BatchStore;

/// Default safety buffer subtracted from the newest transaction time.
pub const DEFAULT_WATERMARK_BUFFER: Duration = Duration::from_secs(120);

/// Tuning for watermark and reference validity.
#[derive(Debug, Clone)]
pub struct DedupSettings {
    pub watermark_buffer: Duration,
    pub policy: ReferencePolicy,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            watermark_buffer: DEFAULT_WATERMARK_BUFFER,
            policy: ReferencePolicy::default(),
        }
    }
}

/// Transactions in the newest batch that no older batch contained.
///
/// Only [`DedupStore::find_new_transactions`] produces this value, and
/// [`DedupStore::prune`] requires it, so history cannot be pruned before it
/// has been compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransactions {
    batch_sequence: u64,
    transactions: Vec<Transaction>,
}

impl NewTransactions {
    /// Sequence of the batch the transactions came from.
    #[must_use]
    pub const fn batch_sequence(&self) -> u64 {
        self.batch_sequence
    }

    /// New transactions in fetch order.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Durable record of seen transactions.
pub struct DedupStore {
    store: Arc<dyn BatchStore>,
    time: BusinessTime,
    settings: DedupSettings,
}

impl DedupStore {
    #[must_use]
    pub fn new(store: Arc<dyn BatchStore>, time: BusinessTime, settings: DedupSettings) -> Self {
        Self {
            store,
            time,
            settings,
        }
    }

    #[must_use]
    pub const fn business_time(&self) -> BusinessTime {
        self.time
    }

    /// Assign the next sequence and persist the batch atomically.
    ///
    /// # Errors
    ///
    /// Returns a store error if the batch could not be written.
    pub fn record_batch(&self, batch: NewBatch) -> Result<FetchBatch> {
        let sequence = self.store.next_sequence()?;
        let batch = batch.into_batch(sequence, self.time.name());
        self.store.append(&batch)?;
        info!(
            sequence,
            status = ?batch.status,
            count = batch.count,
            "Batch recorded"
        );
        Ok(batch)
    }

    /// All retained batches, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the history could not be read.
    pub fn batches(&self) -> Result<Vec<FetchBatch>> {
        self.store.load_all()
    }

    /// The timestamp the next fetch should start from.
    ///
    /// Uses the newest batch that reflects a completed fetch: its latest
    /// dated transaction minus the buffer, or its fetch time when it had
    /// none. This is not always the most recently persisted batch. `Error`
    /// and `SessionExpired` markers are skipped, so a failed fetch never
    /// moves the watermark to its own fetch time and the retry still covers
    /// the gap. With no usable history the watermark is the start of the
    /// current business day.
    ///
    /// # Errors
    ///
    /// Returns a store error if the history could not be read.
    pub fn compute_watermark(&self, now: DateTime<Utc>) -> Result<NaiveDateTime> {
        let batches = self.store.load_all()?;
        let usable = batches.iter().rev().find(|b| b.status.is_complete());

        let watermark = match usable {
            Some(batch) => match batch.latest_posted_at() {
                Some(latest) => latest - self.buffer(),
                None => batch.fetched_at,
            },
            None => self.time.start_of_day(now),
        };
        debug!(
            watermark = %watermark,
            retained = batches.len(),
            "Watermark computed"
        );
        Ok(watermark)
    }

    /// Transactions in the newest batch whose reference no older batch had.
    ///
    /// Returns `None` when no batch exists. Invalid references are ignored
    /// on both sides; a reference repeated within the newest batch is
    /// reported once.
    ///
    /// # Errors
    ///
    /// Returns a store error if the history could not be read.
    pub fn find_new_transactions(&self) -> Result<Option<NewTransactions>> {
        let mut batches = self.store.load_all()?;
        let Some(newest) = batches.pop() else {
            return Ok(None);
        };

        let policy = &self.settings.policy;
        let mut seen: HashSet<String> = HashSet::new();

        if batches.is_empty() {
            // First run: nothing to compare against, every valid row is new.
            info!(
                sequence = newest.sequence,
                count = newest.count,
                "No prior batches, treating newest batch as new"
            );
        } else {
            seen.extend(
                batches
                    .iter()
                    .flat_map(|b| b.transactions.iter())
                    .filter(|tx| policy.accepts(tx))
                    .map(|tx| tx.reference().to_string()),
            );
        }

        let previously_seen = seen.len();
        let mut fresh = Vec::new();
        for tx in newest.transactions {
            if !policy.accepts(&tx) {
                debug!(reference = %tx.reference, "Ignoring transaction with invalid reference");
                continue;
            }
            if seen.insert(tx.reference().to_string()) {
                fresh.push(tx);
            }
        }

        info!(
            sequence = newest.sequence,
            previously_seen,
            new = fresh.len(),
            "Compared newest batch with history"
        );
        Ok(Some(NewTransactions {
            batch_sequence: newest.sequence,
            transactions: fresh,
        }))
    }

    /// Drop every batch older than the one `processed` came from.
    ///
    /// # Errors
    ///
    /// Returns a store error if the history could not be listed.
    pub fn prune(&self, processed: &NewTransactions) -> Result<usize> {
        let removed = self.store.retain_only(processed.batch_sequence)?;
        if removed > 0 {
            debug!(kept = processed.batch_sequence, removed, "Pruned old batches");
        }
        Ok(removed)
    }

    fn buffer(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.watermark_buffer)
            .unwrap_or_else(|_| chrono::Duration::seconds(120))
    }
}
