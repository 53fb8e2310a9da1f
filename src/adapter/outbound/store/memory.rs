//! In-memory batch store.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::domain::FetchBatch;
use crate::error::Result;
use crate::port::BatchStore;

/// Keeps batches in a map keyed by sequence. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryBatchStore {
    batches: Mutex<BTreeMap<u64, FetchBatch>>,
}

impl MemoryBatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing batches.
    #[must_use]
    pub fn with_batches(batches: impl IntoIterator<Item = FetchBatch>) -> Self {
        let store = Self::new();
        {
            let mut map = store.batches.lock();
            for batch in batches {
                map.insert(batch.sequence, batch);
            }
        }
        store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.lock().is_empty()
    }
}

impl BatchStore for MemoryBatchStore {
    fn next_sequence(&self) -> Result<u64> {
        Ok(self
            .batches
            .lock()
            .keys()
            .next_back()
            .map_or(1, |last| last + 1))
    }

    fn append(&self, batch: &FetchBatch) -> Result<()> {
        self.batches.lock().insert(batch.sequence, batch.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<FetchBatch>> {
        Ok(self.batches.lock().values().cloned().collect())
    }

    fn retain_only(&self, sequence: u64) -> Result<usize> {
        let mut batches = self.batches.lock();
        let before = batches.len();
        batches.retain(|seq, _| *seq == sequence);
        Ok(before - batches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountSnapshot, NewBatch};
    use chrono::NaiveDateTime;

    fn batch(sequence: u64) -> FetchBatch {
        let at = NaiveDateTime::default();
        NewBatch::fetched(at, at, AccountSnapshot::default(), vec![]).into_batch(sequence, "UTC")
    }

    #[test]
    fn sequences_continue_after_the_newest_batch() {
        let store = MemoryBatchStore::with_batches([batch(4), batch(2)]);

        assert_eq!(store.next_sequence().unwrap(), 5);
        let loaded: Vec<u64> = store.load_all().unwrap().iter().map(|b| b.sequence).collect();
        assert_eq!(loaded, vec![2, 4]);
    }

    #[test]
    fn retain_only_drops_everything_else() {
        let store = MemoryBatchStore::with_batches([batch(1), batch(2), batch(3)]);

        assert_eq!(store.retain_only(3).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.next_sequence().unwrap(), 4);
    }
}
