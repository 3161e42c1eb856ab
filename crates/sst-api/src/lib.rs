//! Axum HTTP server for the SST Vision analytics engine.
//!
//! This crate provides:
//! - Live alert and inference streams over Server-Sent Events
//! - Cursor-based JSON snapshots of both logs
//! - The latest frame's draw directives for polling renderers
//! - The dashboard page, health probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod producer;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use producer::{open_source, spawn_producer, ProducerState, ProducerStatus};
pub use routes::create_router;
pub use state::AppState;
