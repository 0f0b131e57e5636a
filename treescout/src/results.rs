//! Search result types.
//!
//! A running job is the only writer of its [`SearchResults`]; everyone else
//! holds a cloned handle and reads. Records are moved into the list when an
//! entry matches and are never removed, so a reader always sees a prefix of
//! the final result.
//!
//! ```rust,ignore
//! let results = job.results();
//! let worker = std::thread::spawn(move || job.run());
//! while !worker.is_finished() {
//!     println!("{} matches so far", results.len());
//! }
//! ```
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::fs::{EntryKind, EntryMetadata};

/// One matched filesystem entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Full path of the entry
    pub path: PathBuf,
    /// Name as displayed to the user
    pub display_name: String,
    pub kind: EntryKind,
    /// Size in bytes as reported during enumeration
    pub size: u64,
    pub hidden: bool,
}

impl FileRecord {
    pub fn from_entry(path: &Path, entry: &EntryMetadata) -> Self {
        Self {
            path: path.to_path_buf(),
            display_name: entry.display_name.clone(),
            kind: entry.kind,
            size: entry.size,
            hidden: entry.hidden,
        }
    }
}

/// Append-only, shareable list of matched records
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    records: Arc<RwLock<Vec<FileRecord>>>,
}

impl SearchResults {
    /// Creates a new empty collection
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn push(&self, record: FileRecord) {
        self.records.write().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Copies out the records gathered so far
    pub fn snapshot(&self) -> Vec<FileRecord> {
        self.records.read().clone()
    }

    /// Copies out the records from index `start` onwards, for callers that
    /// consume results incrementally
    pub fn since(&self, start: usize) -> Vec<FileRecord> {
        let records = self.records.read();
        records.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Paths of all records, in match order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.read().iter().map(|r| r.path.clone()).collect()
    }

    /// Calls `f` on each record while holding the read lock
    pub fn for_each(&self, mut f: impl FnMut(&FileRecord)) {
        for record in self.records.read().iter() {
            f(record);
        }
    }
}

/// Statistics returned by a finished (or cancelled) run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Records in the result collection when the run ended
    pub matches: usize,
    pub folders_walked: u64,
    pub entries_seen: u64,
    pub errors_reported: u64,
    /// Whether the run stopped because of a cancel request or an abort
    pub cancelled: bool,
    pub elapsed: Duration,
}
