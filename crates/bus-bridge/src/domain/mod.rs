//! Domain Layer - Pure bridge logic
//!
//! This layer contains:
//! - The routing-engine exchange model
//! - Inbound mappings and delivery modes
//! - Body and header conversion
//! - Configuration
//!
//! RULES:
//! - No I/O operations (except loading configuration files)
//! - No async code

pub mod config;
pub mod conversion;
pub mod exchange;
pub mod mapping;

pub use config::{BridgeConfig, BridgeSettings, DEFAULT_SEND_TIMEOUT_MS, SEND_TIMEOUT_ENV};
pub use conversion::{convert_body, delivery_options, reply_headers};
pub use exchange::{Exchange, ExchangePattern, Headers, RouteMessage};
pub use mapping::{BodyType, DeliveryMode, InboundMapping};
