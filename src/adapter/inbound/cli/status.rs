//! Handler for the `status` command.
//!
//! Reads the batch directory only; the portal is never contacted.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::adapter::inbound::cli::command::StatusArgs;
use crate::adapter::inbound::cli::output;
use crate::application::DedupStore;
use crate::domain::{BatchStatus, FetchBatch, Transaction};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// What the dedup store would do on the next cycle.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub batches: Vec<FetchBatch>,
    pub watermark: NaiveDateTime,
    pub pending: Vec<Transaction>,
}

impl StatusReport {
    /// Snapshot the store as of `now`.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn collect(dedup: &DedupStore, now: DateTime<Utc>) -> Result<Self> {
        let pending = dedup
            .find_new_transactions()?
            .map(|new| new.transactions().to_vec())
            .unwrap_or_default();
        Ok(Self {
            batches: dedup.batches()?,
            watermark: dedup.compute_watermark(now)?,
            pending,
        })
    }
}

fn status_label(status: BatchStatus) -> &'static str {
    match status {
        BatchStatus::Success => "success",
        BatchStatus::NoTransactions => "no transactions",
        BatchStatus::SessionExpired => "session expired",
        BatchStatus::Error => "error",
    }
}

/// Execute the status command.
///
/// # Errors
///
/// Returns configuration or store errors.
pub fn execute(config_path: &Path, args: &StatusArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let dedup = bootstrap::build_dedup(&config)?;
    let report = StatusReport::collect(&dedup, Utc::now())?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Data dir", config.store.data_dir.display());
    output::field("Watermark", report.watermark.format("%d/%m/%Y %H:%M:%S"));

    output::section("Batches");
    if report.batches.is_empty() {
        output::warning("No batches recorded yet");
    }
    for batch in &report.batches {
        output::row(&format!(
            "#{:<6} {}  {:<16} {} transactions",
            batch.sequence,
            batch.fetched_at.format("%d/%m/%Y %H:%M:%S"),
            status_label(batch.status),
            batch.count
        ));
    }

    output::section("Pending");
    if report.pending.is_empty() {
        output::success("Nothing pending");
        return Ok(());
    }
    for tx in report.pending.iter().take(args.limit) {
        let when = tx.posted_at.map_or_else(
            || "--/--/---- --:--:--".to_string(),
            |at| at.format("%d/%m/%Y %H:%M:%S").to_string(),
        );
        output::row(&format!(
            "{}  {}  {:?} {}  {}",
            when,
            tx.reference,
            tx.direction,
            tx.amount,
            tx.description
        ));
    }
    if report.pending.len() > args.limit {
        output::row(&format!("... {} more", report.pending.len() - args.limit));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::store::MemoryBatchStore;
    use crate::application::DedupSettings;
    use crate::domain::{AccountSnapshot, BusinessTime, NewBatch};
    use crate::testkit::domain::{business_instant, credit, local};
    use std::sync::Arc;

    #[test]
    fn reports_pending_transactions_and_watermark() {
        let dedup = DedupStore::new(
            Arc::new(MemoryBatchStore::new()),
            BusinessTime::default(),
            DedupSettings::default(),
        );
        let fetched = local("2025-06-05 09:00:00");
        dedup
            .record_batch(NewBatch::fetched(
                fetched,
                fetched,
                AccountSnapshot::default(),
                vec![credit("FT0000000001", 100_000, "2025-06-05 08:55:00")],
            ))
            .unwrap();

        let report =
            StatusReport::collect(&dedup, business_instant("2025-06-05 09:01:00")).unwrap();

        assert_eq!(report.batches.len(), 1);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.watermark, local("2025-06-05 08:53:00"));
    }

    #[test]
    fn empty_store_reports_start_of_day() {
        let dedup = DedupStore::new(
            Arc::new(MemoryBatchStore::new()),
            BusinessTime::default(),
            DedupSettings::default(),
        );

        let report =
            StatusReport::collect(&dedup, business_instant("2025-06-05 09:01:00")).unwrap();

        assert!(report.batches.is_empty());
        assert!(report.pending.is_empty());
        assert_eq!(report.watermark, local("2025-06-05 00:00:00"));
    }
}
