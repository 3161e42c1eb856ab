//! Bounded append-only event log with cursor-based reads.
//!
//! The log keeps only its newest `capacity` entries, but every entry gets a sequence
//! number from an unbounded logical index space. Readers hold a [`Cursor`] into that
//! space; a cursor that has fallen behind the oldest retained entry simply resumes from
//! it, and the number of skipped entries is reported back as `missed`.
//!
//! The window is published through a `tokio::sync::watch` channel: an append mutates
//! the window in a single publication, so readers see either the state before or the
//! state after a whole entry was added and the oldest one evicted, never in between.
//! The same channel wakes subscribers (see [`crate::broadcast`]).

use std::collections::VecDeque;
use std::sync::Arc;

use sst_models::{Cursor, LogEntry, LogSnapshot};
use tokio::sync::watch;

use crate::metrics;

/// The retained suffix of a log.
#[derive(Debug, Clone)]
pub struct LogWindow {
    /// Sequence number of `entries[0]`
    front: u64,
    entries: VecDeque<Arc<str>>,
    capacity: usize,
}

impl LogWindow {
    fn new(capacity: usize) -> Self {
        Self {
            front: 0,
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Sequence number the next appended entry will get.
    pub fn next_seq(&self) -> u64 {
        self.front + self.entries.len() as u64
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append and evict down to capacity. Returns the new entry's sequence number and
    /// how many entries were evicted.
    fn push(&mut self, message: Arc<str>) -> (u64, usize) {
        let seq = self.next_seq();
        self.entries.push_back(message);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.front += 1;
            evicted += 1;
        }
        (seq, evicted)
    }

    /// Entries with sequence number at or after `cursor`.
    ///
    /// The returned cursor never goes below the one passed in: a cursor past the tail
    /// comes back unchanged and waits for the log to reach it.
    pub fn snapshot_from(&self, cursor: Cursor) -> LogSnapshot {
        let next = self.next_seq();
        if cursor.0 >= next {
            return LogSnapshot {
                entries: Vec::new(),
                next_cursor: cursor,
                missed: 0,
            };
        }

        let start = cursor.0.max(self.front);
        let entries = self
            .entries
            .iter()
            .skip((start - self.front) as usize)
            .zip(start..)
            .map(|(message, seq)| LogEntry::new(seq, Arc::clone(message)))
            .collect();

        LogSnapshot {
            entries,
            next_cursor: Cursor(next),
            missed: start - cursor.0,
        }
    }
}

/// Bounded, append-only log of human-readable event lines.
pub struct EventLog {
    name: Arc<str>,
    tx: watch::Sender<LogWindow>,
}

impl EventLog {
    /// Create a log that retains at most `capacity` entries (at least one).
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (tx, _rx) = watch::channel(LogWindow::new(capacity.max(1)));
        Self {
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Append a message, evicting the oldest entry when full. Returns its sequence number.
    ///
    /// Never waits on readers.
    pub fn append(&self, message: impl Into<Arc<str>>) -> u64 {
        let message = message.into();
        let mut outcome = (0, 0);
        self.tx.send_modify(|window| outcome = window.push(message));

        let (seq, evicted) = outcome;
        metrics::record_log_append(&self.name, evicted);
        seq
    }

    /// Everything at or after `cursor`, plus the cursor to use next time.
    pub fn snapshot_from(&self, cursor: Cursor) -> LogSnapshot {
        self.tx.borrow().snapshot_from(cursor)
    }

    /// Cursor just past the newest entry; reading from it yields only future entries.
    pub fn tail_cursor(&self) -> Cursor {
        Cursor(self.tx.borrow().next_seq())
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.borrow().capacity
    }

    /// Receiver that observes every publication.
    pub(crate) fn watch(&self) -> watch::Receiver<LogWindow> {
        self.tx.subscribe()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("next_cursor", &self.tail_cursor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(log: &EventLog, n: usize) {
        for i in 0..n {
            log.append(format!("event {}", i));
        }
    }

    #[test]
    fn test_append_assigns_sequence_numbers() {
        let log = EventLog::new("alerts", 4);
        assert_eq!(log.append("a"), 0);
        assert_eq!(log.append("b"), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.tail_cursor(), Cursor(2));
    }

    #[test]
    fn test_log_is_bounded_to_newest_entries() {
        let log = EventLog::new("alerts", 20);
        fill(&log, 35);

        assert_eq!(log.len(), 20);
        let snapshot = log.snapshot_from(Cursor::START);
        let expected: Vec<String> = (15..35).map(|i| format!("event {}", i)).collect();
        assert_eq!(snapshot.messages().collect::<Vec<_>>(), expected);
        assert_eq!(snapshot.entries[0].seq, 15);
        assert_eq!(snapshot.next_cursor, Cursor(35));
    }

    #[test]
    fn test_incremental_reads_are_complete_and_ordered() {
        let log = EventLog::new("alerts", 100);
        let mut cursor = Cursor::START;
        let mut seen = Vec::new();

        for batch in [3, 0, 5, 1] {
            fill(&log, batch);
            let snapshot = log.snapshot_from(cursor);
            assert_eq!(snapshot.missed, 0);
            seen.extend(snapshot.entries.iter().map(|e| e.seq));
            cursor = snapshot.next_cursor;
        }

        assert_eq!(seen, (0..9).collect::<Vec<u64>>());
        assert!(log.snapshot_from(cursor).is_empty());
    }

    #[test]
    fn test_evicted_cursor_returns_surviving_suffix() {
        let log = EventLog::new("alerts", 5);
        fill(&log, 3);
        let stale = log.snapshot_from(Cursor::START).next_cursor;
        assert_eq!(stale, Cursor(3));

        fill(&log, 10);
        let snapshot = log.snapshot_from(Cursor(1));

        assert_eq!(snapshot.entries.len(), 5);
        assert_eq!(snapshot.entries[0].seq, 8);
        assert_eq!(snapshot.missed, 7);
        assert_eq!(snapshot.next_cursor, Cursor(13));

        let from_stale = log.snapshot_from(stale);
        assert_eq!(from_stale.entries.len(), 5);
        assert_eq!(from_stale.missed, 5);
    }

    #[test]
    fn test_cursor_past_tail_is_empty() {
        let log = EventLog::new("alerts", 5);
        fill(&log, 2);

        let snapshot = log.snapshot_from(Cursor(40));
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.next_cursor, Cursor(40));
        assert_eq!(snapshot.missed, 0);

        fill(&log, 40);
        let caught_up = log.snapshot_from(snapshot.next_cursor);
        assert_eq!(caught_up.entries[0].seq, 40);
        assert_eq!(caught_up.entries.len(), 2);
        assert_eq!(caught_up.missed, 0);
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let log = EventLog::new("alerts", 0);
        fill(&log, 3);
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.snapshot_from(Cursor::START).messages().collect::<Vec<_>>(), vec!["event 2"]);
    }

    #[test]
    fn test_concurrent_readers_never_see_gaps() {
        let log = Arc::new(EventLog::new("inference", 8));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    let mut cursor = Cursor::START;
                    let mut last_seq: Option<u64> = None;
                    while cursor.0 < 5_000 {
                        let snapshot = log.snapshot_from(cursor);
                        for entry in &snapshot.entries {
                            if let Some(prev) = last_seq {
                                assert!(entry.seq > prev, "sequence went backwards");
                            }
                            assert_eq!(&*entry.message, format!("event {}", entry.seq));
                            last_seq = Some(entry.seq);
                        }
                        // Within one snapshot the entries are contiguous
                        assert!(snapshot
                            .entries
                            .windows(2)
                            .all(|w| w[1].seq == w[0].seq + 1));
                        cursor = snapshot.next_cursor;
                        std::thread::yield_now();
                    }
                })
            })
            .collect();

        fill(&log, 5_000);
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
