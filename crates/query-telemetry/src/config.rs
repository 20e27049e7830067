//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Filter directive (`info`, `cross_query=debug`, ...)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to write logs at all
    pub console_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cross-query".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            console_output: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CQ_SERVICE_NAME`: Service name (default: cross-query)
    /// - `CQ_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `CQ_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `CQ_CONSOLE_OUTPUT`: Enable log output (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CQ_SERVICE_NAME").unwrap_or_else(|_| "cross-query".to_string()),

            log_level: env::var("CQ_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CQ_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            console_output: env::var("CQ_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Override the filter directive.
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
