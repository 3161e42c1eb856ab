//! Real-time analytics over a tracked-detection stream.
//!
//! The engine consumes per-frame `(track_id, class_id, bbox)` detections and derives:
//! - dwell-time escalation for objects that stay near one spot ([`dwell`])
//! - overlap alerts between two class groups ([`overlap`])
//! - bounded alert and inference-summary logs ([`event_log`]) streamed to any number of
//!   subscribers ([`broadcast`])
//!
//! [`AnalyticsEngine`] wires these together around a [`FrameSource`].

pub mod broadcast;
pub mod config;
pub mod dwell;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod metrics;
pub mod overlap;
pub mod pipeline;
pub mod source;

pub use broadcast::{EventBroadcaster, Subscription};
pub use config::{ClassSets, EngineConfig, LogConfig};
pub use dwell::{DwellConfig, DwellLevel, DwellObservation, DwellTracker};
pub use engine::{AnalyticsEngine, ALERT_LOG, INFERENCE_LOG};
pub use error::{EngineError, EngineResult};
pub use event_log::{EventLog, LogWindow};
pub use overlap::{OverlapDetector, OverlapPair, PairwiseOverlap, SweepOverlap};
pub use pipeline::AnalyticsPipeline;
pub use source::{parse_record, ChannelSource, Frame, FrameSource, JsonLinesSource};
