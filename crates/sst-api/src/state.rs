//! Application state.

use std::future::Future;
use std::sync::Arc;

use sst_engine::{AnalyticsEngine, EventBroadcaster};
use sst_models::FrameAnnotations;
use tokio::sync::watch;

use crate::config::ApiConfig;
use crate::producer::ProducerStatus;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub alerts: EventBroadcaster,
    pub inferences: EventBroadcaster,
    pub producer: Arc<ProducerStatus>,
    latest: Arc<watch::Sender<Option<Arc<FrameAnnotations>>>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Create application state around an engine's logs.
    pub fn new(config: ApiConfig, engine: &AnalyticsEngine) -> Self {
        Self {
            config,
            alerts: engine.alert_broadcaster(),
            inferences: engine.inference_broadcaster(),
            producer: Arc::new(ProducerStatus::new()),
            latest: Arc::new(watch::Sender::new(None)),
            shutdown: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Replace the most recent frame's annotations.
    pub fn publish_frame(&self, annotations: FrameAnnotations) {
        self.latest.send_replace(Some(Arc::new(annotations)));
    }

    /// Annotations of the most recent frame, if any frame was processed.
    pub fn latest_frame(&self) -> Option<Arc<FrameAnnotations>> {
        self.latest.borrow().clone()
    }

    /// Ask long-lived responses (event streams) to finish.
    pub fn trigger_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once shutdown has been triggered.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    // State dropped without a shutdown; nothing will ever signal.
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}
