// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! # Bus Bridge
//!
//! Forwards units of work from a routing engine onto the in-process message
//! bus, and writes replies back into the unit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Routing Engine                          │
//! │            (Exchange, completion callback)                   │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ process_async(unit, done)
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BridgeProcessor                          │
//! │  convert body → copy headers → choose delivery mode          │
//! └──────┬─────────────────────┬───────────────────────┬────────┘
//!        │ publish             │ send                  │ request
//!        ▼                     ▼                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    shared-bus (MessageBus)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Completion
//!
//! | Mode | Unit supports response | `done` sync flag | Response slot |
//! |------|------------------------|------------------|---------------|
//! | publish | any | `true` | untouched |
//! | point-to-point | no | `true` | untouched |
//! | point-to-point | yes | `false` | reply body and headers |
//!
//! Conversion and send errors, reply timeouts and recipient failures are
//! recorded on the unit. The processor never reports them to the caller.
//!
//! ## Usage
//!
//! ```ignore
//! use bus_bridge::{AsyncProcessor, BridgeProcessor, BridgeSettings, Exchange, InboundMapping, RouteMessage};
//! use shared_bus::InMemoryMessageBus;
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryMessageBus::new());
//! let mapping = InboundMapping::new("direct:pricing", "svc.pricing");
//! let processor = BridgeProcessor::new(bus, mapping, &BridgeSettings::from_env())?;
//!
//! let sync = processor.process_async(Exchange::in_out(RouteMessage::new("sku-1")), |unit, sync| {
//!     // runs later on the bus runtime, with the reply in unit.out_message()
//! });
//! assert!(!sync);
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use domain::{
    convert_body, delivery_options, reply_headers, BodyType, BridgeConfig, BridgeSettings,
    DeliveryMode, Exchange, ExchangePattern, Headers, InboundMapping, RouteMessage,
    DEFAULT_SEND_TIMEOUT_MS, SEND_TIMEOUT_ENV,
};
pub use error::{BridgeError, ConfigError, ConversionError};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use ports::{AsyncProcessor, InboundUnit, Processor};
pub use service::{Bridge, BridgeProcessor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
