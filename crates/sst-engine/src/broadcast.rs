//! Live fan-out of an [`EventLog`] to independent subscribers.
//!
//! Each subscription owns its cursor and is woken by the log's change notification,
//! so the producer never waits on subscribers and one slow subscriber never delays
//! another. An optional minimum interval coalesces bursts into batches.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};
use sst_models::{Cursor, LogEntry, LogSnapshot};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::warn;

use crate::event_log::{EventLog, LogWindow};
use crate::metrics;

/// Hands out subscriptions to one log.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    log: Arc<EventLog>,
    min_interval: Option<Duration>,
}

impl EventBroadcaster {
    /// Create a broadcaster. `min_interval` bounds how often a subscriber receives a batch.
    pub fn new(log: Arc<EventLog>, min_interval: Option<Duration>) -> Self {
        Self { log, min_interval }
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Subscribe from the oldest retained entry.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_from(Cursor::START)
    }

    /// Subscribe from an explicit cursor (e.g. a client resuming after reconnect).
    pub fn subscribe_from(&self, cursor: Cursor) -> Subscription {
        Subscription {
            log_name: self.log.shared_name(),
            rx: self.log.watch(),
            cursor,
            min_interval: self.min_interval,
            last_batch: None,
        }
    }
}

/// One subscriber's private view of a log.
pub struct Subscription {
    log_name: Arc<str>,
    rx: watch::Receiver<LogWindow>,
    cursor: Cursor,
    min_interval: Option<Duration>,
    last_batch: Option<Instant>,
}

impl Subscription {
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Take whatever is available now without waiting.
    pub fn try_next(&mut self) -> Option<LogSnapshot> {
        let snapshot = self.rx.borrow_and_update().snapshot_from(self.cursor);
        self.cursor = snapshot.next_cursor;

        if snapshot.missed > 0 {
            warn!(
                log = %self.log_name,
                missed = snapshot.missed,
                "Subscriber fell behind, evicted entries skipped"
            );
            metrics::record_subscriber_missed(&self.log_name, snapshot.missed);
        }

        (!snapshot.is_empty()).then_some(snapshot)
    }

    /// Wait for the next non-empty batch.
    ///
    /// Returns `None` once the log has been dropped and everything was delivered.
    pub async fn next_batch(&mut self) -> Option<LogSnapshot> {
        loop {
            if let (Some(interval), Some(last)) = (self.min_interval, self.last_batch) {
                tokio::time::sleep_until(last + interval).await;
            }

            if let Some(snapshot) = self.try_next() {
                self.last_batch = Some(Instant::now());
                return Some(snapshot);
            }

            if self.rx.changed().await.is_err() {
                return self.try_next();
            }
        }
    }

    /// Flatten into a stream of individual entries in append order.
    pub fn into_stream(self) -> impl Stream<Item = LogEntry> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            let batch = sub.next_batch().await?;
            Some((batch, sub))
        })
        .flat_map(|batch| stream::iter(batch.entries))
    }
}
