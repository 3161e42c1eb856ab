//! Per-frame render instructions.
//!
//! The analytics pipeline does not draw; it emits an ordered list of directives and
//! aggregate counts that an external renderer turns into pixels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bbox::{BoundingBox, Point};

/// Visual severity of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Tracked object within normal dwell
    Normal,
    /// Dwell past the warning threshold
    Warning,
    /// Dwell past the alert threshold
    Alert,
    /// Subject overlapping an object of interest
    Overlap,
    /// Neutral overlay text (counts)
    Info,
}

impl Intent {
    /// RGB color for this intent.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Intent::Normal => [0, 255, 0],
            Intent::Warning => [255, 255, 0],
            Intent::Alert => [255, 0, 0],
            Intent::Overlap => [0, 0, 255],
            Intent::Info => [50, 50, 50],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Normal => "normal",
            Intent::Warning => "warning",
            Intent::Alert => "alert",
            Intent::Overlap => "overlap",
            Intent::Info => "info",
        }
    }
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawDirective {
    /// Box outline
    Rectangle { bbox: BoundingBox, intent: Intent },
    /// Caption anchored at its baseline-left position
    Text {
        text: String,
        position: Point,
        intent: Intent,
    },
}

impl DrawDirective {
    pub fn rectangle(bbox: BoundingBox, intent: Intent) -> Self {
        Self::Rectangle { bbox, intent }
    }

    pub fn text(text: impl Into<String>, position: Point, intent: Intent) -> Self {
        Self::Text {
            text: text.into(),
            position,
            intent,
        }
    }

    pub fn intent(&self) -> Intent {
        match self {
            Self::Rectangle { intent, .. } | Self::Text { intent, .. } => *intent,
        }
    }
}

/// Aggregate counts drawn in the frame corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounts {
    /// Detections in the overlap-subject classes
    pub people: usize,
    /// Detections in the dwell-tracked classes
    pub vehicles: usize,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotations {
    /// Zero-based index of the frame since the pipeline started
    pub frame_index: u64,
    /// Draw directives in paint order
    pub directives: Vec<DrawDirective>,
    pub counts: FrameCounts,
    /// Wall-clock time the frame was processed
    pub processed_at: DateTime<Utc>,
}

impl FrameAnnotations {
    /// Overlay text lines for the counts, positioned like the dashboard overlay.
    pub fn count_overlay(&self) -> [DrawDirective; 2] {
        [
            DrawDirective::text(format!("People: {}", self.counts.people), Point::new(20, 30), Intent::Info),
            DrawDirective::text(format!("Vehicles: {}", self.counts.vehicles), Point::new(20, 60), Intent::Info),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_serialization() {
        let d = DrawDirective::rectangle(BoundingBox::new(0, 0, 4, 4), Intent::Warning);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "rectangle");
        assert_eq!(json["intent"], "warning");
        assert_eq!(json["bbox"], serde_json::json!([0, 0, 4, 4]));
    }

    #[test]
    fn test_count_overlay() {
        let frame = FrameAnnotations {
            frame_index: 0,
            directives: Vec::new(),
            counts: FrameCounts { people: 3, vehicles: 1 },
            processed_at: Utc::now(),
        };
        let [people, vehicles] = frame.count_overlay();
        assert_eq!(
            people,
            DrawDirective::text("People: 3", Point::new(20, 30), Intent::Info)
        );
        assert_eq!(vehicles.intent(), Intent::Info);
    }
}
