//! Inbound mapping: how one routing endpoint maps onto a bus address
//!
//! # Example
//!
//! ```ignore
//! use bus_bridge::domain::{BodyType, InboundMapping};
//!
//! let mapping = InboundMapping::new("direct:orders", "events.orders")
//!     .with_publish(true)
//!     .with_body_type(BodyType::Json);
//! mapping.validate()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Body transformation applied before sending
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    /// Forward the body unchanged
    #[default]
    Passthrough,
    /// Convert to UTF-8 text
    Text,
    /// Convert to raw bytes
    Bytes,
    /// Parse into JSON
    Json,
}

/// How a mapped message is delivered on the bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// One-to-many, no reply
    Publish,
    /// One-to-one, reply when the unit supports it
    PointToPoint,
}

/// Mapping from a routing-engine endpoint to a bus address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMapping {
    /// Routing-engine endpoint this mapping serves
    pub uri: String,
    /// Target bus address
    pub address: String,
    /// Publish to all consumers instead of point-to-point
    #[serde(default)]
    pub publish: bool,
    /// Copy routing headers onto the bus message
    #[serde(default = "default_headers_copy")]
    pub headers_copy: bool,
    /// Body transformation
    #[serde(default)]
    pub body_type: BodyType,
}

fn default_headers_copy() -> bool {
    true
}

impl InboundMapping {
    /// Point-to-point mapping with header copying and passthrough bodies
    pub fn new(uri: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            address: address.into(),
            publish: false,
            headers_copy: default_headers_copy(),
            body_type: BodyType::default(),
        }
    }

    pub fn with_publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }

    pub fn with_headers_copy(mut self, headers_copy: bool) -> Self {
        self.headers_copy = headers_copy;
        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.publish {
            DeliveryMode::Publish
        } else {
            DeliveryMode::PointToPoint
        }
    }

    /// Reject mappings that cannot be routed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::EmptyUri);
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress {
                uri: self.uri.clone(),
            });
        }
        Ok(())
    }
}
