//! Dwell-time tracking for stationary objects.
//!
//! Each track is anchored at the first position it was seen. Small jitter around the
//! anchor keeps the dwell timer running; a displacement beyond the move threshold
//! starts a fresh episode at the new position. The dwell duration is classified into
//! graduated levels against two ordered thresholds.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sst_models::{Intent, Point, TrackId};
use tracing::debug;

use crate::metrics;

/// Configuration for dwell tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellConfig {
    /// Displacement from the anchor (pixels) that restarts the dwell timer
    pub move_threshold: f64,
    /// Dwell at which an object is flagged as a warning
    pub warning_time: Duration,
    /// Dwell at which an object raises an alert
    pub alert_time: Duration,
    /// Maximum number of tracks kept; the least recently observed is dropped first
    pub track_capacity: usize,
    /// Tracks unseen for this long are dropped (`Duration::ZERO` disables expiry)
    pub idle_ttl: Duration,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            move_threshold: 40.0,
            warning_time: Duration::from_secs(45),
            alert_time: Duration::from_secs(60),
            track_capacity: 1024,
            idle_ttl: Duration::from_secs(300),
        }
    }
}

/// Graduated dwell classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DwellLevel {
    Normal,
    Warning,
    Alert,
}

impl DwellLevel {
    /// Render intent for this level.
    pub fn intent(&self) -> Intent {
        match self {
            DwellLevel::Normal => Intent::Normal,
            DwellLevel::Warning => Intent::Warning,
            DwellLevel::Alert => Intent::Alert,
        }
    }
}

/// Outcome of observing a track once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellObservation {
    pub level: DwellLevel,
    /// Time since the current anchor was set
    pub elapsed: Duration,
    /// Whether this observation (re)anchored the track
    pub anchored: bool,
}

#[derive(Debug, Clone, Copy)]
struct TrackState {
    anchor_center: Point,
    anchor_time: Instant,
    last_seen: Instant,
}

impl TrackState {
    fn anchored_at(center: Point, now: Instant) -> Self {
        Self {
            anchor_center: center,
            anchor_time: now,
            last_seen: now,
        }
    }
}

/// Per-track dwell state machine.
pub struct DwellTracker {
    config: DwellConfig,
    tracks: HashMap<TrackId, TrackState>,
}

impl DwellTracker {
    /// Create a new tracker.
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DwellConfig {
        &self.config
    }

    /// Observe a track at `center` at time `now` and classify its dwell.
    ///
    /// The anchor only moves when the displacement from it exceeds the move threshold,
    /// so dwell accumulates from the original anchor through any amount of jitter.
    pub fn observe(&mut self, track_id: TrackId, center: Point, now: Instant) -> DwellObservation {
        let move_threshold = self.config.move_threshold;

        let anchored = match self.tracks.get_mut(&track_id) {
            Some(state) if state.anchor_center.distance(&center) > move_threshold => {
                debug!(track_id, x = center.x, y = center.y, "Track moved, resetting dwell anchor");
                *state = TrackState::anchored_at(center, now);
                true
            }
            Some(state) => {
                state.last_seen = state.last_seen.max(now);
                false
            }
            None => {
                self.make_room();
                self.tracks.insert(track_id, TrackState::anchored_at(center, now));
                true
            }
        };

        if anchored {
            return DwellObservation {
                level: DwellLevel::Normal,
                elapsed: Duration::ZERO,
                anchored,
            };
        }

        let elapsed = self
            .tracks
            .get(&track_id)
            .map(|state| now.saturating_duration_since(state.anchor_time))
            .unwrap_or_default();

        DwellObservation {
            level: self.classify(elapsed),
            elapsed,
            anchored,
        }
    }

    /// Classify a dwell duration against the configured thresholds.
    pub fn classify(&self, elapsed: Duration) -> DwellLevel {
        if elapsed >= self.config.alert_time {
            DwellLevel::Alert
        } else if elapsed >= self.config.warning_time {
            DwellLevel::Warning
        } else {
            DwellLevel::Normal
        }
    }

    /// Drop tracks not observed within the idle TTL. Returns how many were dropped.
    pub fn evict_idle(&mut self, now: Instant) -> usize {
        let ttl = self.config.idle_ttl;
        if ttl.is_zero() {
            return 0;
        }

        let before = self.tracks.len();
        self.tracks
            .retain(|_, state| now.saturating_duration_since(state.last_seen) < ttl);
        let removed = before - self.tracks.len();

        if removed > 0 {
            debug!(removed, remaining = self.tracks.len(), "Expired idle tracks");
            metrics::record_tracks_evicted("idle", removed);
        }
        removed
    }

    /// Number of tracks currently held.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether state exists for a track.
    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    /// Forget all tracks.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Evict the least recently observed track when at capacity.
    fn make_room(&mut self) {
        if self.tracks.len() < self.config.track_capacity {
            return;
        }

        let oldest = self
            .tracks
            .iter()
            .min_by_key(|(_, state)| state.last_seen)
            .map(|(id, _)| *id);

        if let Some(id) = oldest {
            self.tracks.remove(&id);
            debug!(track_id = id, "Track map at capacity, evicted least recently seen track");
            metrics::record_tracks_evicted("capacity", 1);
        }
    }
}
