//! # Query Telemetry
//!
//! Structured logging for Cross-Query clients and endorsers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use query_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CQ_SERVICE_NAME` | `cross-query` | Service name |
//! | `CQ_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `CQ_JSON_LOGS` | `false` | JSON log lines |
//! | `CQ_CONSOLE_OUTPUT` | `true` | Write logs to stderr |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Init(String),

    /// Filter directive or other setting is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
