//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: String,
    /// Newline-delimited JSON frame records; `None` reads stdin
    pub frame_source: Option<PathBuf>,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
    /// Interval between SSE keep-alive comments
    pub sse_keep_alive: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            frame_source: None,
            metrics_enabled: true,
            sse_keep_alive: Duration::from_secs(15),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            frame_source: std::env::var("FRAME_SOURCE").ok().and_then(|s| parse_frame_source(&s)),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            sse_keep_alive: Duration::from_secs(
                std::env::var("SSE_KEEP_ALIVE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&secs| secs > 0)
                    .unwrap_or(15),
            ),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// `-` and blank mean stdin.
fn parse_frame_source(raw: &str) -> Option<PathBuf> {
    match raw.trim() {
        "" | "-" => None,
        path => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_source_stdin_markers() {
        assert_eq!(parse_frame_source("-"), None);
        assert_eq!(parse_frame_source("  "), None);
        assert_eq!(
            parse_frame_source("/var/lib/sst/frames.jsonl"),
            Some(PathBuf::from("/var/lib/sst/frames.jsonl"))
        );
    }

    #[test]
    fn test_production_flag() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
