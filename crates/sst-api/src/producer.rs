//! Background task feeding frames through the analytics engine.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use serde::Serialize;
use sst_engine::{AnalyticsEngine, FrameSource, JsonLinesSource};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// Lifecycle of the producer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerState {
    Starting,
    Running,
    Finished,
    Failed,
}

impl ProducerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ProducerState::Running,
            2 => ProducerState::Finished,
            3 => ProducerState::Failed,
            _ => ProducerState::Starting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerState::Starting => "starting",
            ProducerState::Running => "running",
            ProducerState::Finished => "finished",
            ProducerState::Failed => "failed",
        }
    }
}

/// Producer state shared with the readiness probe.
#[derive(Debug)]
pub struct ProducerStatus {
    state: AtomicU8,
    frames: AtomicU64,
}

impl ProducerStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ProducerState::Starting as u8),
            frames: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ProducerState {
        ProducerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: ProducerState) {
        self.state.store(state as u8, Ordering::Release);
        metrics::set_producer_running(state == ProducerState::Running);
    }

    pub fn is_running(&self) -> bool {
        self.state() == ProducerState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for ProducerStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the configured frame source: a JSON-lines file, or stdin.
pub async fn open_source(config: &ApiConfig) -> ApiResult<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match &config.frame_source {
        Some(path) => Box::new(JsonLinesSource::from_path(path).await?),
        None => Box::new(JsonLinesSource::stdin()),
    };
    Ok(source)
}

/// Run the engine over `source` on a background task, publishing every frame to `state`.
pub fn spawn_producer(
    mut engine: AnalyticsEngine,
    mut source: Box<dyn FrameSource>,
    state: AppState,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        state.producer.set_state(ProducerState::Running);
        let _running = RunningGuard(&state.producer);
        info!("Frame producer started");

        let result = engine
            .run(source.as_mut(), |annotations| {
                state.producer.record_frame();
                state.publish_frame(annotations);
            })
            .await;

        match result {
            Ok(frames) => {
                info!(frames, "Frame source ended");
                state.producer.set_state(ProducerState::Finished);
            }
            Err(e) => {
                error!(error = %e, frames = state.producer.frames(), "Frame producer failed");
                state.producer.set_state(ProducerState::Failed);
            }
        }
    })
}

/// Marks the producer failed if its task unwinds while still running.
struct RunningGuard<'a>(&'a ProducerStatus);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.0.is_running() {
            error!(frames = self.0.frames(), "Frame producer stopped unexpectedly");
            self.0.set_state(ProducerState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sst_engine::{ChannelSource, EngineConfig, EngineResult, Frame};
    use sst_models::{BoundingBox, Detection};

    #[tokio::test]
    async fn test_producer_publishes_frames_and_finishes() {
        let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
        let state = AppState::new(ApiConfig::default(), &engine);
        let (tx, source) = ChannelSource::new(4);

        assert_eq!(state.producer.state(), ProducerState::Starting);
        let handle = spawn_producer(engine, Box::new(source), state.clone());

        tx.send(Frame::new(vec![Detection::new(1, 0, BoundingBox::new(0, 0, 5, 5))], 2.0))
            .await
            .unwrap();
        tx.send(Frame::new(Vec::new(), 2.0)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(state.producer.state(), ProducerState::Finished);
        assert_eq!(state.producer.frames(), 2);
        assert_eq!(state.latest_frame().unwrap().frame_index, 1);
        assert_eq!(state.inferences.log().len(), 2);
    }

    struct PanickingSource;

    #[async_trait]
    impl FrameSource for PanickingSource {
        async fn next_frame(&mut self) -> EngineResult<Option<Frame>> {
            panic!("detector crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_producer_is_marked_failed() {
        let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
        let state = AppState::new(ApiConfig::default(), &engine);

        let handle = spawn_producer(engine, Box::new(PanickingSource), state.clone());
        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(state.producer.state(), ProducerState::Failed);
    }

    #[test]
    fn test_state_round_trips_through_atomic() {
        let status = ProducerStatus::new();
        for s in [ProducerState::Running, ProducerState::Failed, ProducerState::Finished] {
            status.set_state(s);
            assert_eq!(status.state(), s);
        }
    }
}
