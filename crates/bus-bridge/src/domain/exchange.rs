//! Routing-engine exchange model
//!
//! An `Exchange` is the unit of work the routing engine hands to the bridge:
//! an in message, an optional out message for replies, and a failure slot.

use serde::{Deserialize, Serialize};
use shared_bus::Body;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::BridgeError;
use crate::ports::InboundUnit;

/// Routing-engine headers (name -> JSON value)
pub type Headers = BTreeMap<String, serde_json::Value>;

/// Message as seen by the routing engine
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteMessage {
    /// Payload
    pub body: Body,
    /// Headers
    pub headers: Headers,
}

impl RouteMessage {
    /// Create a message with no headers
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            headers: Headers::new(),
        }
    }

    /// Builder-style method to add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Message exchange pattern
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangePattern {
    /// Fire-and-forget, no reply slot
    #[default]
    InOnly,
    /// Request-reply, the out message will carry the reply
    InOut,
}

impl ExchangePattern {
    /// Whether an exchange with this pattern accepts a reply
    pub fn is_out_capable(self) -> bool {
        matches!(self, Self::InOut)
    }
}

/// A unit of work flowing from the routing engine
#[derive(Clone, Debug)]
pub struct Exchange {
    id: String,
    pattern: ExchangePattern,
    in_message: RouteMessage,
    out_message: Option<RouteMessage>,
    failure: Option<BridgeError>,
}

impl Exchange {
    /// Create an exchange with a fresh id
    pub fn new(pattern: ExchangePattern, in_message: RouteMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pattern,
            in_message,
            out_message: None,
            failure: None,
        }
    }

    /// Fire-and-forget exchange
    pub fn in_only(in_message: RouteMessage) -> Self {
        Self::new(ExchangePattern::InOnly, in_message)
    }

    /// Request-reply exchange
    pub fn in_out(in_message: RouteMessage) -> Self {
        Self::new(ExchangePattern::InOut, in_message)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> ExchangePattern {
        self.pattern
    }

    pub fn in_message(&self) -> &RouteMessage {
        &self.in_message
    }

    pub fn in_message_mut(&mut self) -> &mut RouteMessage {
        &mut self.in_message
    }

    /// Reply written by the bridge, if any
    pub fn out_message(&self) -> Option<&RouteMessage> {
        self.out_message.as_ref()
    }

    /// Failure cause recorded by the bridge, if any
    pub fn failure(&self) -> Option<&BridgeError> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

impl InboundUnit for Exchange {
    fn id(&self) -> &str {
        &self.id
    }

    fn body(&self) -> &Body {
        &self.in_message.body
    }

    fn headers(&self) -> &Headers {
        &self.in_message.headers
    }

    fn supports_response(&self) -> bool {
        self.pattern.is_out_capable()
    }

    fn set_response(&mut self, body: Body, headers: Headers) {
        self.out_message = Some(RouteMessage { body, headers });
    }

    fn set_failure(&mut self, cause: BridgeError) {
        self.failure = Some(cause);
    }
}
