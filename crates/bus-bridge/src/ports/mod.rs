//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - how the routing engine calls the bridge
//! - Driven Ports (outbound) - the message bus, `shared_bus::MessageBus`

pub mod inbound;

pub use inbound::{AsyncProcessor, InboundUnit, Processor};
pub use shared_bus::{MessageBus, ReplyHandle};
