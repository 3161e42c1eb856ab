//! Axum API server binary.

use std::net::SocketAddr;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sst_api::{create_router, metrics, open_source, spawn_producer, ApiConfig, AppState};
use sst_engine::{AnalyticsEngine, EngineConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or_else(|_| config.is_production());

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "sst=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting sst-api");
    info!(
        "API config: host={}, port={}, environment={}",
        config.host, config.port, config.environment
    );

    // Install the recorder before the engine starts emitting
    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder, metrics disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let engine = match AnalyticsEngine::new(EngineConfig::from_env()) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid engine configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create application state
    let state = AppState::new(config.clone(), &engine);

    let source = match open_source(&config).await {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to open frame source: {}", e);
            std::process::exit(1);
        }
    };
    let producer = spawn_producer(engine, source, state.clone());

    // Create router
    let app = create_router(state.clone(), metrics_handle);

    // Bind and serve
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    let shutdown_state = state.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open event streams end, letting graceful shutdown complete
            shutdown_state.trigger_shutdown();
        })
        .await;

    if let Err(e) = served {
        error!("Server error: {}", e);
    }

    producer.abort();
    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
