//! Engine context tying the pipeline to its shared logs.

use std::sync::Arc;

use sst_models::FrameAnnotations;
use tracing::info;

use crate::broadcast::EventBroadcaster;
use crate::config::EngineConfig;
use crate::dwell::DwellTracker;
use crate::error::EngineResult;
use crate::event_log::EventLog;
use crate::pipeline::AnalyticsPipeline;
use crate::source::FrameSource;

/// Name of the alert log in logs and metrics.
pub const ALERT_LOG: &str = "alerts";
/// Name of the inference summary log in logs and metrics.
pub const INFERENCE_LOG: &str = "inference";

/// Owns the analytics state for one video stream.
///
/// Create it at startup, hand out broadcasters to the transport, then move it into the
/// producer task.
pub struct AnalyticsEngine {
    config: EngineConfig,
    pipeline: AnalyticsPipeline,
    alerts: EventBroadcaster,
    inferences: EventBroadcaster,
}

impl AnalyticsEngine {
    /// Validate the config and build the engine.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let alerts = Arc::new(EventLog::new(ALERT_LOG, config.alert_log.capacity));
        let inferences = Arc::new(EventLog::new(INFERENCE_LOG, config.inference_log.capacity));

        let pipeline = AnalyticsPipeline::new(
            config.classes.clone(),
            DwellTracker::new(config.dwell.clone()),
            Arc::clone(&alerts),
            Arc::clone(&inferences),
        );

        info!(
            dwell_classes = ?config.classes.dwell,
            overlap_subjects = ?config.classes.overlap_subjects,
            overlap_objects = ?config.classes.overlap_objects,
            move_threshold = config.dwell.move_threshold,
            warning_secs = config.dwell.warning_time.as_secs(),
            alert_secs = config.dwell.alert_time.as_secs(),
            "Analytics engine configured"
        );

        Ok(Self {
            alerts: EventBroadcaster::new(alerts, config.alert_log.stream_interval),
            inferences: EventBroadcaster::new(inferences, config.inference_log.stream_interval),
            pipeline,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn alerts(&self) -> &Arc<EventLog> {
        self.alerts.log()
    }

    pub fn inferences(&self) -> &Arc<EventLog> {
        self.inferences.log()
    }

    pub fn alert_broadcaster(&self) -> EventBroadcaster {
        self.alerts.clone()
    }

    pub fn inference_broadcaster(&self) -> EventBroadcaster {
        self.inferences.clone()
    }

    pub fn pipeline(&self) -> &AnalyticsPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut AnalyticsPipeline {
        &mut self.pipeline
    }

    /// Drive the pipeline from `source` until it ends or fails.
    pub async fn run<S, F>(&mut self, source: &mut S, on_frame: F) -> EngineResult<u64>
    where
        S: FrameSource + ?Sized,
        F: FnMut(FrameAnnotations) + Send,
    {
        self.pipeline.run(source, on_frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::time::Duration;

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.dwell.warning_time = Duration::from_secs(120);
        assert!(matches!(AnalyticsEngine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_logs_are_shared_with_broadcasters() {
        let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.alerts().name(), ALERT_LOG);
        assert_eq!(engine.inferences().capacity(), 20);

        let broadcaster = engine.alert_broadcaster();
        assert!(Arc::ptr_eq(broadcaster.log(), engine.pipeline().alerts()));
        assert_eq!(broadcaster.min_interval(), Some(Duration::from_secs(1)));
        assert_eq!(
            engine.inference_broadcaster().min_interval(),
            Some(Duration::from_millis(500))
        );
    }
}
