//! Engine metrics, recorded through the `metrics` facade.
//!
//! Nothing is exported unless the host process installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Pipeline metrics
    pub const FRAMES_PROCESSED_TOTAL: &str = "sst_frames_processed_total";
    pub const FRAME_DURATION_SECONDS: &str = "sst_frame_duration_seconds";
    pub const DETECTIONS_SKIPPED_TOTAL: &str = "sst_detections_skipped_total";
    pub const ALERTS_TOTAL: &str = "sst_alerts_total";

    // Dwell tracker metrics
    pub const TRACKS_ACTIVE: &str = "sst_tracks_active";
    pub const TRACKS_EVICTED_TOTAL: &str = "sst_tracks_evicted_total";

    // Event log metrics
    pub const LOG_APPENDS_TOTAL: &str = "sst_log_appends_total";
    pub const LOG_EVICTIONS_TOTAL: &str = "sst_log_evictions_total";
    pub const SUBSCRIBER_MISSED_TOTAL: &str = "sst_subscriber_missed_entries_total";
}

/// Record one processed frame.
pub fn record_frame(duration_secs: f64) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FRAME_DURATION_SECONDS).record(duration_secs);
}

/// Record detections dropped as malformed.
pub fn record_detection_skipped(reason: &'static str, count: usize) {
    counter!(names::DETECTIONS_SKIPPED_TOTAL, "reason" => reason).increment(count as u64);
}

/// Record an alert by kind (`dwell`, `overlap`).
pub fn record_alert(kind: &'static str) {
    counter!(names::ALERTS_TOTAL, "kind" => kind).increment(1);
}

/// Update the tracked-object gauge.
pub fn set_tracks_active(count: usize) {
    gauge!(names::TRACKS_ACTIVE).set(count as f64);
}

/// Record track state evictions by reason (`capacity`, `idle`).
pub fn record_tracks_evicted(reason: &'static str, count: usize) {
    counter!(names::TRACKS_EVICTED_TOTAL, "reason" => reason).increment(count as u64);
}

/// Record an append, and any entries it pushed out.
pub fn record_log_append(log: &str, evicted: usize) {
    let labels = [("log", log.to_string())];
    counter!(names::LOG_APPENDS_TOTAL, &labels).increment(1);
    if evicted > 0 {
        counter!(names::LOG_EVICTIONS_TOTAL, &labels).increment(evicted as u64);
    }
}

/// Record entries a subscriber never saw because they were evicted first.
pub fn record_subscriber_missed(log: &str, missed: u64) {
    let labels = [("log", log.to_string())];
    counter!(names::SUBSCRIBER_MISSED_TOTAL, &labels).increment(missed);
}
