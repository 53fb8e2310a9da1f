//! One JSON file per batch in a data directory.
//!
//! Files are named `<prefix>_<YYYYmmdd_HHMMSS>_<sequence>.json`. Writes go to
//! a temp file in the same directory and are renamed into place, so a crash
//! mid-write never leaves a partial batch behind.

use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::FetchBatch;
use crate::error::{Result, StoreError};
use crate::port::BatchStore;

/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "transactions";

/// Directory-backed [`BatchStore`].
#[derive(Debug, Clone)]
pub struct JsonBatchStore {
    dir: PathBuf,
    prefix: String,
}

impl JsonBatchStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, batch: &FetchBatch) -> String {
        format!(
            "{}_{}_{:06}.json",
            self.prefix,
            batch.fetched_at.format("%Y%m%d_%H%M%S"),
            batch.sequence
        )
    }

    /// Sequence encoded in a batch file name, or `None` for foreign files.
    fn sequence_of(&self, name: &str) -> Option<u64> {
        let stem = name.strip_suffix(".json")?;
        let rest = stem.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        let (_, sequence) = rest.rsplit_once('_')?;
        sequence.parse().ok()
    }

    /// Batch files currently on disk, sorted by sequence.
    fn entries(&self) -> Result<Vec<(u64, PathBuf)>> {
        let read = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(sequence) = self.sequence_of(name) {
                entries.push((sequence, entry.path()));
            }
        }
        entries.sort_by_key(|(sequence, _)| *sequence);
        Ok(entries)
    }

    fn read_batch(path: &Path) -> std::result::Result<FetchBatch, StoreError> {
        let file = fs::File::open(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }
}

impl BatchStore for JsonBatchStore {
    fn next_sequence(&self) -> Result<u64> {
        Ok(self
            .entries()?
            .last()
            .map_or(1, |(sequence, _)| sequence + 1))
    }

    fn append(&self, batch: &FetchBatch) -> Result<()> {
        let path = self.dir.join(self.file_name(batch));
        let persist_err = |reason: String| StoreError::Persist {
            path: path.display().to_string(),
            reason,
        };

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| persist_err(format!("failed to create temp file: {e}")))?;
        serde_json::to_writer_pretty(&mut temp, batch)?;
        temp.flush()
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| persist_err(format!("failed to flush temp file: {e}")))?;
        temp.persist(&path)
            .map_err(|e| persist_err(e.error.to_string()))?;

        debug!(path = %path.display(), sequence = batch.sequence, count = batch.count, "Batch persisted");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<FetchBatch>> {
        let mut batches = Vec::new();
        for (_, path) in self.entries()? {
            match Self::read_batch(&path) {
                Ok(batch) => batches.push(batch),
                Err(e) => warn!(error = %e, "Skipping unreadable batch file"),
            }
        }
        Ok(batches)
    }

    fn retain_only(&self, sequence: u64) -> Result<usize> {
        let mut removed = 0;
        for (seq, path) in self.entries()? {
            if seq == sequence {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove old batch"),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountSnapshot, BatchStatus, NewBatch};
    use crate::testkit::domain::{credit, local};

    fn batch(sequence: u64, fetched_at: &str) -> FetchBatch {
        NewBatch::fetched(
            local(fetched_at),
            local("2025-06-05 00:00:00"),
            AccountSnapshot::default(),
            vec![credit("FT25156000001", 500_000, fetched_at)],
        )
        .into_batch(sequence, "Asia/Ho_Chi_Minh")
    }

    #[test]
    fn appended_batches_load_in_sequence_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::open(dir.path(), DEFAULT_PREFIX).unwrap();

        store.append(&batch(2, "2025-06-05 09:00:20")).unwrap();
        store.append(&batch(1, "2025-06-05 09:00:00")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].sequence, 1);
        assert_eq!(loaded[1], batch(2, "2025-06-05 09:00:20"));
        assert_eq!(store.next_sequence().unwrap(), 3);
    }

    #[test]
    fn file_name_carries_timestamp_and_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::open(dir.path(), DEFAULT_PREFIX).unwrap();

        store.append(&batch(7, "2025-06-05 09:15:42")).unwrap();

        assert!(dir
            .path()
            .join("transactions_20250605_091542_000007.json")
            .exists());
    }

    #[test]
    fn foreign_and_temp_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::open(dir.path(), DEFAULT_PREFIX).unwrap();
        fs::write(dir.path().join(".tmpAbC123"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("transactions_latest.json"), "{}").unwrap();

        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.next_sequence().unwrap(), 1);
    }

    #[test]
    fn corrupt_batch_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::open(dir.path(), DEFAULT_PREFIX).unwrap();
        store.append(&batch(1, "2025-06-05 09:00:00")).unwrap();
        fs::write(
            dir.path().join("transactions_20250605_090020_000002.json"),
            "{ not json",
        )
        .unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sequence, 1);
    }

    #[test]
    fn retain_only_keeps_the_named_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::open(dir.path(), DEFAULT_PREFIX).unwrap();
        for (seq, at) in [(1, "2025-06-05 09:00:00"), (2, "2025-06-05 09:00:20"), (3, "2025-06-05 09:00:40")] {
            store.append(&batch(seq, at)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        assert_eq!(store.retain_only(3).unwrap(), 2);

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sequence, 3);
        assert_eq!(loaded[0].status, BatchStatus::Success);
        assert!(dir.path().join("notes.txt").exists());
    }
}
