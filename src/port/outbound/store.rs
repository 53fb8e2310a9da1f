//! Batch persistence port.

use crate::domain::FetchBatch;
use crate::error::Result;

/// Ordered, append-only storage for fetch batches.
///
/// Single writer. `append` must be atomic: a reader sees either the whole
/// batch or nothing.
pub trait BatchStore: Send + Sync {
    /// Sequence number for the next batch.
    fn next_sequence(&self) -> Result<u64>;

    /// Persist a batch.
    fn append(&self, batch: &FetchBatch) -> Result<()>;

    /// All retained batches, oldest first.
    fn load_all(&self) -> Result<Vec<FetchBatch>>;

    /// Delete every batch except `sequence`. Returns the number removed.
    fn retain_only(&self, sequence: u64) -> Result<usize>;
}
