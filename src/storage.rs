//! Durable storage collaborators for the analytics store.
//!
//! The store persists each collection into its own slot, keyed by the
//! collection's slot name. The trait is deliberately minimal: a slot
//! either holds a full record sequence or nothing at all, and every
//! write replaces the slot wholesale. That keeps the durable view
//! trivially consistent with the in-memory mutation that produced it.

use crate::error::{Result, StatsError};
use crate::types::EntryRecord;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A key-value slot per collection name.
///
/// Implementations must tolerate slots that were never written
/// (`read` returns `Ok(None)`), and must make a failed `write` loud: the
/// store treats any error here as fatal for the operation in progress
/// rather than letting memory and disk diverge silently.
pub trait DurableBackend: Send + Sync {
    /// Load the record sequence stored under `slot`, if any.
    fn read(&self, slot: &str) -> Result<Option<Vec<EntryRecord>>>;

    /// Replace the record sequence stored under `slot`.
    fn write(&mut self, slot: &str, records: &[EntryRecord]) -> Result<()>;
}

/// File-per-slot backend rooted at a directory.
///
/// Each slot is a single JSON document at `<root>/<slot>.json`. Writes
/// go to a temporary sibling first, are synced, and then renamed over
/// the destination so a crash never leaves a half-written slot behind.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open a backend rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory holding the slot files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }

    fn sync_root(&self) -> Result<()> {
        let dir = File::open(&self.root)?;
        dir.sync_all()?;
        Ok(())
    }
}

impl DurableBackend for FileBackend {
    fn read(&self, slot: &str) -> Result<Option<Vec<EntryRecord>>> {
        let bytes = match std::fs::read(self.slot_path(slot)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("slot '{slot}' absent, reading as empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.is_empty() {
            return Ok(None);
        }

        let records =
            serde_json::from_slice(&bytes).map_err(|source| StatsError::CorruptSlot {
                slot: slot.to_string(),
                source,
            })?;
        Ok(Some(records))
    }

    fn write(&mut self, slot: &str, records: &[EntryRecord]) -> Result<()> {
        let path = self.slot_path(slot);
        let temp_path = path.with_extension("json.tmp");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, records)?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &path)?;
        self.sync_root()
    }
}

/// In-memory backend used as the durable collaborator in tests.
///
/// Clones share one slot table, so a "process restart" is simulated by
/// building a second store over a clone of the same backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<Mutex<FxHashMap<String, Vec<EntryRecord>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots that have been written at least once.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }
}

impl DurableBackend for MemoryBackend {
    fn read(&self, slot: &str) -> Result<Option<Vec<EntryRecord>>> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write(&mut self, slot: &str, records: &[EntryRecord]) -> Result<()> {
        self.slots.lock().insert(slot.to_string(), records.to_vec());
        Ok(())
    }
}
