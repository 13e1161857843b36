//! Service Layer
//!
//! Bridge processors and the registry that builds them from configuration.

pub mod bridge;
pub mod bridge_processor;

pub use bridge::Bridge;
pub use bridge_processor::BridgeProcessor;
