//! Shared data models for the SST Vision analytics engine.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes and points in pixel coordinates
//! - Per-frame detections and frame records
//! - Draw directives consumed by the renderer
//! - Event log entries and snapshots consumed by the transport layer

pub mod annotation;
pub mod bbox;
pub mod classes;
pub mod detection;
pub mod event;

// Re-export common types
pub use annotation::{DrawDirective, FrameAnnotations, FrameCounts, Intent};
pub use bbox::{BoundingBox, Point};
pub use classes::{ClassNames, COCO_CLASSES};
pub use detection::{Detection, FrameRecord, TrackId};
pub use event::{Cursor, LogEntry, LogSnapshot};
