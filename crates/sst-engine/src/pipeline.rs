//! Per-frame analytics: dwell escalation, overlap alerts, inference summaries.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use sst_models::{
    BoundingBox, ClassNames, DrawDirective, FrameAnnotations, FrameCounts, Intent, TrackId,
};
use tracing::{debug, info, warn};

use crate::config::ClassSets;
use crate::dwell::{DwellLevel, DwellTracker};
use crate::error::EngineResult;
use crate::event_log::EventLog;
use crate::metrics;
use crate::overlap::{OverlapDetector, PairwiseOverlap};
use crate::source::{Frame, FrameSource};

/// Caption offset below a tracked box
const LABEL_OFFSET: i32 = 20;
/// Alert caption offset above a dwelling box
const DWELL_ALERT_OFFSET: i32 = 15;
/// Alert caption offset above an overlap subject
const OVERLAP_ALERT_OFFSET: i32 = 30;
/// Frame time between idle-track sweeps
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// A detection that passed validation, with its class.
#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: TrackId,
    class_id: u32,
    bbox: BoundingBox,
}

/// Stateful per-frame analytics.
///
/// Owned by the single producer task; the two logs are shared with readers.
pub struct AnalyticsPipeline {
    classes: ClassSets,
    names: ClassNames,
    tracker: DwellTracker,
    overlap: Box<dyn OverlapDetector>,
    alerts: Arc<EventLog>,
    inferences: Arc<EventLog>,
    frame_index: u64,
    last_sweep: Option<Instant>,
}

impl AnalyticsPipeline {
    pub fn new(
        classes: ClassSets,
        tracker: DwellTracker,
        alerts: Arc<EventLog>,
        inferences: Arc<EventLog>,
    ) -> Self {
        Self {
            classes,
            names: ClassNames::default(),
            tracker,
            overlap: Box::new(PairwiseOverlap),
            alerts,
            inferences,
            frame_index: 0,
            last_sweep: None,
        }
    }

    /// Replace the class label table.
    pub fn with_class_names(mut self, names: ClassNames) -> Self {
        self.names = names;
        self
    }

    /// Replace the overlap strategy.
    pub fn with_overlap_detector(mut self, detector: Box<dyn OverlapDetector>) -> Self {
        self.overlap = detector;
        self
    }

    pub fn tracker(&self) -> &DwellTracker {
        &self.tracker
    }

    pub fn alerts(&self) -> &Arc<EventLog> {
        &self.alerts
    }

    pub fn inferences(&self) -> &Arc<EventLog> {
        &self.inferences
    }

    /// Frames processed so far.
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Run one frame through the analytics and return what to draw.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameAnnotations {
        let started = Instant::now();
        let now = frame.captured_at;

        let mut dwelling = Vec::new();
        let mut subjects = Vec::new();
        let mut objects = Vec::new();

        for detection in &frame.detections {
            let Some((id, bbox)) = detection.tracked() else {
                let reason = if detection.track_id.is_none() {
                    "missing_track_id"
                } else {
                    "invalid_bbox"
                };
                warn!(
                    class_id = detection.class_id,
                    bbox = ?detection.bbox,
                    reason,
                    "Skipping malformed detection"
                );
                metrics::record_detection_skipped(reason, 1);
                continue;
            };

            let tracked = Tracked {
                id,
                class_id: detection.class_id,
                bbox,
            };
            if self.classes.is_dwell(tracked.class_id) {
                dwelling.push(tracked);
            }
            if self.classes.is_subject(tracked.class_id) {
                subjects.push(tracked);
            }
            if self.classes.is_object(tracked.class_id) {
                objects.push(tracked);
            }
        }

        let mut directives = Vec::with_capacity(dwelling.len() * 2 + subjects.len());
        self.dwell_directives(&dwelling, now, &mut directives);
        self.overlap_directives(&subjects, &objects, &mut directives);

        let counts = FrameCounts {
            people: subjects.len(),
            vehicles: dwelling.len(),
        };

        self.inferences.append(self.summary(frame));
        self.sweep_idle(now);
        metrics::set_tracks_active(self.tracker.len());

        let annotations = FrameAnnotations {
            frame_index: self.frame_index,
            directives,
            counts,
            processed_at: Utc::now(),
        };
        self.frame_index += 1;

        metrics::record_frame(started.elapsed().as_secs_f64());
        debug!(
            frame = annotations.frame_index,
            detections = frame.detections.len(),
            people = counts.people,
            vehicles = counts.vehicles,
            "Processed frame"
        );
        annotations
    }

    fn dwell_directives(&mut self, dwelling: &[Tracked], now: Instant, out: &mut Vec<DrawDirective>) {
        for det in dwelling {
            let observation = self.tracker.observe(det.id, det.bbox.center(), now);
            let intent = observation.level.intent();
            let label = self.names.label(det.class_id);

            out.push(DrawDirective::rectangle(det.bbox, intent));
            out.push(DrawDirective::text(
                format!("{} ID: {}", label, det.id),
                det.bbox.below(LABEL_OFFSET),
                intent,
            ));

            if observation.level == DwellLevel::Alert {
                let message = format!(
                    "ALERT: {} {} idle {}s",
                    label,
                    det.id,
                    observation.elapsed.as_secs()
                );
                warn!(track_id = det.id, idle_secs = observation.elapsed.as_secs(), "{}", message);
                metrics::record_alert("dwell");
                out.push(DrawDirective::text(
                    message.clone(),
                    det.bbox.above(DWELL_ALERT_OFFSET),
                    Intent::Alert,
                ));
                self.alerts.append(message);
            }
        }
    }

    /// Object labels come from the class table, so the default group reads `cell phone`.
    fn overlap_directives(&self, subjects: &[Tracked], objects: &[Tracked], out: &mut Vec<DrawDirective>) {
        if subjects.is_empty() || objects.is_empty() {
            return;
        }

        let group_a: Vec<(TrackId, BoundingBox)> = subjects.iter().map(|d| (d.id, d.bbox)).collect();
        let group_b: Vec<(TrackId, BoundingBox)> = objects.iter().map(|d| (d.id, d.bbox)).collect();

        for pair in self.overlap.find_overlaps(&group_a, &group_b) {
            let subject = &subjects[pair.index_a];
            let object = &objects[pair.index_b];

            let message = format!(
                "ALERT: {} {} using {}",
                capitalize(&self.names.label(subject.class_id)),
                pair.id_a,
                self.names.label(object.class_id)
            );
            warn!(subject_id = pair.id_a, object_id = pair.id_b, "{}", message);
            metrics::record_alert("overlap");

            out.push(DrawDirective::rectangle(subject.bbox, Intent::Overlap));
            out.push(DrawDirective::text(
                message.clone(),
                subject.bbox.above(OVERLAP_ALERT_OFFSET),
                Intent::Overlap,
            ));
            self.alerts.append(message);
        }
    }

    /// `"{n}: {labels}, {latency}ms"` over every detection in the frame.
    fn summary(&self, frame: &Frame) -> String {
        if frame.detections.is_empty() {
            return format!("0: no detections, {:.1}ms", frame.inference_ms);
        }

        let labels: Vec<Cow<'_, str>> = frame
            .detections
            .iter()
            .map(|d| self.names.label(d.class_id))
            .collect();
        format!(
            "{}: {}, {:.1}ms",
            labels.len(),
            labels.join(", "),
            frame.inference_ms
        )
    }

    fn sweep_idle(&mut self, now: Instant) {
        match self.last_sweep {
            None => self.last_sweep = Some(now),
            Some(last) if now.saturating_duration_since(last) >= SWEEP_INTERVAL => {
                self.tracker.evict_idle(now);
                self.last_sweep = Some(now);
            }
            Some(_) => {}
        }
    }

    /// Pull frames until the source ends, handing each frame's annotations to `on_frame`.
    ///
    /// Returns the number of frames processed, or the source's error.
    pub async fn run<S, F>(&mut self, source: &mut S, mut on_frame: F) -> EngineResult<u64>
    where
        S: FrameSource + ?Sized,
        F: FnMut(FrameAnnotations) + Send,
    {
        let start_index = self.frame_index;
        info!("Analytics pipeline started");

        while let Some(frame) = source.next_frame().await? {
            let annotations = self.process_frame(&frame);
            on_frame(annotations);
        }

        let processed = self.frame_index - start_index;
        info!(frames = processed, "Frame source exhausted, pipeline stopped");
        Ok(processed)
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
