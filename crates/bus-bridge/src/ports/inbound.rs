//! Inbound Ports (Driving Ports)
//!
//! The routing engine drives the bridge through these traits.

use async_trait::async_trait;
use shared_bus::Body;

use crate::domain::Headers;
use crate::error::BridgeError;

/// A unit of work handed to the bridge by the routing engine
///
/// The bridge takes ownership of the unit for the duration of handling and
/// hands it back through the completion callback.
pub trait InboundUnit: Send + 'static {
    /// Identifier used in logs
    fn id(&self) -> &str;

    /// Payload of the in message
    fn body(&self) -> &Body;

    /// Headers of the in message
    fn headers(&self) -> &Headers;

    /// Whether the unit has a response slot (a reply is expected)
    fn supports_response(&self) -> bool;

    /// Write the reply into the response slot
    fn set_response(&mut self, body: Body, headers: Headers);

    /// Mark the unit failed
    fn set_failure(&mut self, cause: BridgeError);
}

/// Callback-style processor (Driving Port)
///
/// `done(unit, sync)` is invoked exactly once. The return value equals the
/// `sync` flag: `true` when handling finished before returning, `false` when
/// completion happens later on another task.
pub trait AsyncProcessor<U: InboundUnit>: Send + Sync {
    fn process_async<F>(&self, unit: U, done: F) -> bool
    where
        F: FnOnce(U, bool) + Send + 'static;
}

/// Await-style processor (Driving Port)
///
/// Resolves once handling of the unit has finished. Failures of the
/// messaging layer are recorded on the returned unit, not in the `Err`
/// branch; `Err` only means the completion itself was lost.
#[async_trait]
pub trait Processor<U: InboundUnit>: Send + Sync {
    async fn process(&self, unit: U) -> Result<U, BridgeError>;
}
