//! Event log entries and cursor-based snapshots.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Position in an event log's logical index space.
///
/// Logical indices grow without bound even though the log keeps only its newest
/// entries, so a cursor stays meaningful across evictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub u64);

impl Cursor {
    /// Cursor at the very first entry ever appended.
    pub const START: Cursor = Cursor(0);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Cursor {
    fn from(v: u64) -> Self {
        Cursor(v)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable log line with its logical sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub message: Arc<str>,
}

impl LogEntry {
    pub fn new(seq: u64, message: impl Into<Arc<str>>) -> Self {
        Self {
            seq,
            message: message.into(),
        }
    }
}

/// Result of reading a log from a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnapshot {
    /// Entries at or after the cursor, oldest first
    pub entries: Vec<LogEntry>,
    /// Cursor to pass on the next read
    pub next_cursor: Cursor,
    /// Entries that were evicted before the reader got to them
    pub missed: u64,
}

impl LogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Message texts, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_ref())
    }
}
