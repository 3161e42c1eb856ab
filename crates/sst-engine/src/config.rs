//! Engine configuration.

use std::time::Duration;

use crate::dwell::DwellConfig;
use crate::error::{EngineError, EngineResult};

/// Which detector classes feed which analytics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSets {
    /// Classes run through the dwell tracker (COCO vehicles by default)
    pub dwell: Vec<u32>,
    /// Overlap subjects, the first overlap group (persons by default)
    pub overlap_subjects: Vec<u32>,
    /// Overlap objects, the second overlap group (cell phones by default)
    pub overlap_objects: Vec<u32>,
}

impl ClassSets {
    pub fn is_dwell(&self, class_id: u32) -> bool {
        self.dwell.contains(&class_id)
    }

    pub fn is_subject(&self, class_id: u32) -> bool {
        self.overlap_subjects.contains(&class_id)
    }

    pub fn is_object(&self, class_id: u32) -> bool {
        self.overlap_objects.contains(&class_id)
    }
}

impl Default for ClassSets {
    fn default() -> Self {
        Self {
            dwell: vec![1, 2, 3, 5, 7],
            overlap_subjects: vec![0],
            overlap_objects: vec![67],
        }
    }
}

/// Capacity and delivery cadence of one event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Maximum retained entries
    pub capacity: usize,
    /// Minimum time between batches delivered to one subscriber
    pub stream_interval: Option<Duration>,
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub classes: ClassSets,
    pub dwell: DwellConfig,
    pub alert_log: LogConfig,
    pub inference_log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classes: ClassSets::default(),
            dwell: DwellConfig::default(),
            alert_log: LogConfig {
                capacity: 20,
                stream_interval: Some(Duration::from_millis(1000)),
            },
            inference_log: LogConfig {
                capacity: 20,
                stream_interval: Some(Duration::from_millis(500)),
            },
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            classes: ClassSets {
                dwell: class_list_var("DWELL_CLASSES").unwrap_or(defaults.classes.dwell),
                overlap_subjects: class_list_var("OVERLAP_SUBJECT_CLASSES")
                    .unwrap_or(defaults.classes.overlap_subjects),
                overlap_objects: class_list_var("OVERLAP_OBJECT_CLASSES")
                    .unwrap_or(defaults.classes.overlap_objects),
            },
            dwell: DwellConfig {
                move_threshold: std::env::var("DWELL_MOVE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.dwell.move_threshold),
                warning_time: Duration::from_secs(
                    std::env::var("DWELL_WARNING_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(45),
                ),
                alert_time: Duration::from_secs(
                    std::env::var("DWELL_ALERT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(60),
                ),
                track_capacity: std::env::var("TRACK_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.dwell.track_capacity),
                idle_ttl: Duration::from_secs(
                    std::env::var("TRACK_IDLE_TTL_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(300),
                ),
            },
            alert_log: LogConfig {
                capacity: std::env::var("ALERT_LOG_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.alert_log.capacity),
                stream_interval: interval_var("ALERT_STREAM_INTERVAL_MS")
                    .unwrap_or(defaults.alert_log.stream_interval),
            },
            inference_log: LogConfig {
                capacity: std::env::var("INFERENCE_LOG_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.inference_log.capacity),
                stream_interval: interval_var("INFERENCE_STREAM_INTERVAL_MS")
                    .unwrap_or(defaults.inference_log.stream_interval),
            },
        }
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> EngineResult<()> {
        let dwell = &self.dwell;
        if !dwell.move_threshold.is_finite() || dwell.move_threshold < 0.0 {
            return Err(EngineError::config(format!(
                "move threshold must be a non-negative number, got {}",
                dwell.move_threshold
            )));
        }
        if dwell.warning_time > dwell.alert_time {
            return Err(EngineError::config(format!(
                "warning time ({:?}) must not exceed alert time ({:?})",
                dwell.warning_time, dwell.alert_time
            )));
        }
        if dwell.track_capacity == 0 {
            return Err(EngineError::config("track capacity must be at least 1"));
        }
        if self.alert_log.capacity == 0 || self.inference_log.capacity == 0 {
            return Err(EngineError::config("event log capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Parse a comma-separated class id list; `None` when unset or unparsable.
fn class_list_var(key: &str) -> Option<Vec<u32>> {
    let raw = std::env::var(key).ok()?;
    parse_class_list(&raw)
}

fn parse_class_list(raw: &str) -> Option<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Milliseconds interval; `0` disables batching (push every append immediately).
fn interval_var(key: &str) -> Option<Option<Duration>> {
    let ms: u64 = std::env::var(key).ok()?.parse().ok()?;
    Some((ms > 0).then(|| Duration::from_millis(ms)))
}
