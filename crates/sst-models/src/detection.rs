//! Detections as produced by the external detector/tracker.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Tracker-assigned identity, stable across frames while the object is tracked.
pub type TrackId = i64;

/// One tracked detection in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Track id; absent when the tracker has not (yet) assigned one
    #[serde(default)]
    pub track_id: Option<TrackId>,
    /// Detector class id (COCO numbering by default)
    pub class_id: u32,
    /// Box in pixel coordinates
    pub bbox: BoundingBox,
}

impl Detection {
    /// Create a tracked detection.
    pub fn new(track_id: TrackId, class_id: u32, bbox: BoundingBox) -> Self {
        Self {
            track_id: Some(track_id),
            class_id,
            bbox,
        }
    }

    /// Track id and box, when the detection is usable for analytics.
    ///
    /// Returns `None` for a missing id or a degenerate box.
    pub fn tracked(&self) -> Option<(TrackId, BoundingBox)> {
        match self.track_id {
            Some(id) if self.bbox.is_valid() => Some((id, self.bbox)),
            _ => None,
        }
    }
}

/// Wire form of one frame's detector output.
///
/// Decoding is lenient per detection: an entry that does not decode as a [`Detection`]
/// (wrong-length box, missing or mistyped field) is dropped and counted in `malformed`,
/// and the rest of the frame is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireFrame")]
pub struct FrameRecord {
    /// Detections in this frame
    pub detections: Vec<Detection>,
    /// Model inference latency in milliseconds
    pub inference_ms: f64,
    /// Seconds since the start of the stream, when the producer recorded it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Detections dropped while decoding
    #[serde(skip_serializing)]
    pub malformed: usize,
}

#[derive(Deserialize)]
struct WireFrame {
    #[serde(default)]
    detections: Vec<WireDetection>,
    #[serde(default)]
    inference_ms: f64,
    #[serde(default)]
    t: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireDetection {
    Decoded(Detection),
    Malformed(IgnoredAny),
}

impl From<WireFrame> for FrameRecord {
    fn from(wire: WireFrame) -> Self {
        let total = wire.detections.len();
        let detections: Vec<Detection> = wire
            .detections
            .into_iter()
            .filter_map(|d| match d {
                WireDetection::Decoded(detection) => Some(detection),
                WireDetection::Malformed(_) => None,
            })
            .collect();

        Self {
            malformed: total - detections.len(),
            detections,
            inference_ms: wire.inference_ms,
            t: wire.t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_rejects_malformed() {
        let good = Detection::new(1, 2, BoundingBox::new(0, 0, 10, 10));
        assert_eq!(good.tracked(), Some((1, BoundingBox::new(0, 0, 10, 10))));

        let degenerate = Detection::new(1, 2, BoundingBox::new(10, 0, 10, 10));
        assert_eq!(degenerate.tracked(), None);

        let untracked = Detection {
            track_id: None,
            class_id: 2,
            bbox: BoundingBox::new(0, 0, 10, 10),
        };
        assert_eq!(untracked.tracked(), None);
    }

    #[test]
    fn test_frame_record_from_json() {
        let json = r#"{"detections":[{"track_id":5,"class_id":2,"bbox":[90,90,110,110]},{"class_id":0,"bbox":[1,1,2,2]}],"inference_ms":12.5}"#;
        let record: FrameRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.detections.len(), 2);
        assert_eq!(record.detections[0].track_id, Some(5));
        assert_eq!(record.detections[1].track_id, None);
        assert_eq!(record.inference_ms, 12.5);
        assert_eq!(record.t, None);
        assert_eq!(record.malformed, 0);
    }

    #[test]
    fn test_undecodable_detections_are_dropped() {
        let json = r#"{"detections":[
            {"track_id":1,"class_id":2,"bbox":[0,0,10,10]},
            {"track_id":2,"class_id":2,"bbox":[0,0,10]},
            {"track_id":3,"bbox":[0,0,10,10]},
            {"track_id":4,"class_id":"car","bbox":[0,0,10,10]},
            {"track_id":5,"class_id":2},
            "garbage",
            {"track_id":6,"class_id":2,"bbox":[0.5,0.2,10.7,10.1]}
        ],"inference_ms":3.0}"#;
        let record: FrameRecord = serde_json::from_str(json).unwrap();

        assert_eq!(
            record.detections,
            vec![
                Detection::new(1, 2, BoundingBox::new(0, 0, 10, 10)),
                Detection::new(6, 2, BoundingBox::new(0, 0, 10, 10)),
            ]
        );
        assert_eq!(record.malformed, 5);
        assert_eq!(record.inference_ms, 3.0);
    }

    #[test]
    fn test_empty_frame_record() {
        let record: FrameRecord = serde_json::from_str("{}").unwrap();
        assert!(record.detections.is_empty());
        assert_eq!(record.inference_ms, 0.0);
    }
}
