//! Durable file-backed ledger.
//!
//! One newline-delimited JSON record per append, written before the
//! in-memory indexes are updated. Opening an existing file replays it to
//! rebuild the indexes; a torn trailing line (crash mid-append) is
//! detected, logged, and truncated away without losing prior records.
//!
//! ## Durability modes
//!
//! - [`Durability::Strict`] (default contract): fsync after every append.
//!   Once `append` returns, the record survives process restart.
//! - [`Durability::Buffered`]: leave syncing to the OS, sync on drop.
//!   Faster, with a crash window.

use crate::contract::{AtomicFilter, Ledger, LedgerStats, ScanOptions, ScanPage};
use crate::error::{LedgerError, Result};
use crate::store::RecordStore;
use chronicle_core::Atomic;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// When appended records are made durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// fsync per append; zero data loss on crash
    #[default]
    Strict,
    /// OS-buffered; sync on drop
    Buffered,
}

struct FileState {
    store: RecordStore,
    file: File,
}

/// Append-only ledger persisted to a single file.
pub struct FileLedger {
    path: PathBuf,
    durability: Durability,
    state: RwLock<FileState>,
}

impl FileLedger {
    /// Open (or create) a ledger file with strict durability.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_durability(path, Durability::Strict)
    }

    /// Open (or create) a ledger file with an explicit durability mode.
    pub fn with_durability(path: impl AsRef<Path>, durability: Durability) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let store = Self::replay(&path, &mut file)?;
        debug!(path = %path.display(), records = store.len(), "opened ledger file");

        Ok(Self {
            path,
            durability,
            state: RwLock::new(FileState { store, file }),
        })
    }

    /// The ledger file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild the in-memory store from the file, truncating a torn tail.
    fn replay(path: &Path, file: &mut File) -> Result<RecordStore> {
        let mut store = RecordStore::default();
        let reader = BufReader::new(File::open(path)?);

        // Byte offset of the end of the last fully valid line.
        let mut valid_end: u64 = 0;
        let mut torn = false;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if torn {
                // A parse failure anywhere but the tail is corruption.
                return Err(LedgerError::Storage(format!(
                    "corrupt ledger file {}: unreadable record at line {}",
                    path.display(),
                    line_no
                )));
            }
            match serde_json::from_str::<Atomic>(&line) {
                Ok(atomic) => {
                    Self::replay_record(&mut store, atomic, path, line_no)?;
                    valid_end += line.len() as u64 + 1;
                }
                Err(_) => torn = true,
            }
        }

        if torn {
            warn!(
                path = %path.display(),
                offset = valid_end,
                "torn record at ledger tail, truncating"
            );
            file.set_len(valid_end)?;
            file.sync_data()?;
        }

        Ok(store)
    }

    fn replay_record(
        store: &mut RecordStore,
        atomic: Atomic,
        path: &Path,
        line_no: usize,
    ) -> Result<()> {
        // A file this process wrote only contains admitted records, so an
        // admission failure here means the file was edited underneath us.
        match store.admit(atomic) {
            Ok(_) => Ok(()),
            Err(LedgerError::ChainIntegrity(reason)) | Err(LedgerError::InvalidRecord(reason)) => {
                Err(LedgerError::Storage(format!(
                    "corrupt ledger file {}: line {}: {}",
                    path.display(),
                    line_no,
                    reason
                )))
            }
            Err(e) => Err(e),
        }
    }
}

impl Ledger for FileLedger {
    fn append(&self, atomic: Atomic) -> Result<String> {
        let mut state = self.state.write();

        let (admission, hash) = state.store.check(&atomic)?;
        if admission == crate::chain::Admission::Duplicate {
            return Ok(hash);
        }

        // Persist before indexing: a failed write must leave no trace in
        // the in-memory store.
        let mut line = serde_json::to_string(&atomic)?;
        line.push('\n');
        state.file.write_all(line.as_bytes())?;
        if self.durability == Durability::Strict {
            state.file.sync_data()?;
        }

        state.store.insert(atomic)?;
        Ok(hash)
    }

    fn contains(&self, hash: &str) -> Result<bool> {
        Ok(self.state.read().store.contains(hash))
    }

    fn query(&self, filter: &AtomicFilter) -> Result<Vec<Atomic>> {
        Ok(self.state.read().store.query(filter))
    }

    fn scan(&self, options: &ScanOptions) -> Result<ScanPage> {
        Ok(self.state.read().store.scan(options))
    }

    fn stats(&self) -> Result<LedgerStats> {
        Ok(self.state.read().store.stats())
    }
}

impl Drop for FileLedger {
    fn drop(&mut self) {
        if self.durability == Durability::Buffered {
            let _ = self.state.write().file.sync_data();
        }
    }
}
