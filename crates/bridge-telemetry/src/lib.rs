//! # Bridge Telemetry
//!
//! Structured logging for the bus bridge, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//!
//!     // Processor and bus events are now written to stdout
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `bus-bridge` | Service name in logs |
//! | `BRIDGE_LOG_LEVEL` | `info` | Log level filter, falls back to `RUST_LOG` |
//! | `BRIDGE_JSON_LOGS` | `false` | JSON output (defaults on inside containers) |
//! | `BRIDGE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![allow(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Convenience macro for creating a span around one bridged unit.
///
/// # Example
///
/// ```rust,ignore
/// use bridge_telemetry::bridge_span;
///
/// let _span = bridge_span!("forward", address = "svc.pricing").entered();
/// ```
#[macro_export]
macro_rules! bridge_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
