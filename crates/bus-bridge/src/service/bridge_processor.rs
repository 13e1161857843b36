//! Bridge Processor
//!
//! Forwards one inbound unit onto the message bus and reports completion
//! back to the routing engine.
//!
//! ## Flow
//!
//! 1. Convert the body and build delivery options (cached timeout, headers
//!    copied when the mapping says so)
//! 2. Dispatch by delivery mode:
//!    - publish: fan out, complete synchronously
//!    - point-to-point, unit supports a response: request, complete later
//!      from the reply handler with `sync = false`
//!    - point-to-point otherwise: send, complete synchronously
//! 3. Any conversion or send error is recorded on the unit and the unit is
//!    completed synchronously
//!
//! The processor always reports that it finished handling the unit, even
//! when the unit failed. Callers inspect the unit's failure slot.

use async_trait::async_trait;
use shared_bus::{Body, BusError, BusMessage, DeliveryOptions, MessageBus, ReplyHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::{
    convert_body, delivery_options, reply_headers, BridgeSettings, DeliveryMode, InboundMapping,
};
use crate::error::{BridgeError, ConfigError, ConversionError};
use crate::metrics::BridgeMetrics;
use crate::ports::{AsyncProcessor, InboundUnit, Processor};

/// Outcome of dispatching one unit
enum Dispatch {
    /// Nothing left to wait for
    Completed,
    /// A reply will arrive on this handle
    AwaitingReply(ReplyHandle),
}

/// Completion owed for a unit waiting on its reply
///
/// Dropped without [`finish`](Self::finish) (the reply task never ran, e.g.
/// the runtime shut down), the unit is failed with `ReplyDropped` and `done`
/// is still invoked once.
struct PendingCompletion<U, F>
where
    U: InboundUnit,
    F: FnOnce(U, bool),
{
    slot: Option<(U, F)>,
    address: String,
    metrics: Arc<BridgeMetrics>,
}

impl<U, F> PendingCompletion<U, F>
where
    U: InboundUnit,
    F: FnOnce(U, bool),
{
    fn new(unit: U, done: F, address: &str, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            slot: Some((unit, done)),
            address: address.to_string(),
            metrics,
        }
    }

    fn finish(mut self, result: Result<BusMessage, BusError>) {
        let Some((mut unit, done)) = self.slot.take() else {
            return;
        };
        match result {
            Ok(reply) => {
                unit.set_response(reply.body, reply_headers(&reply.headers));
                self.metrics.record_reply();
                debug!(exchange_id = unit.id(), "Reply written to unit");
            }
            Err(cause) => {
                self.metrics.record_reply_failure();
                warn!(exchange_id = unit.id(), error = %cause, "Reply failed, unit marked failed");
                unit.set_failure(BridgeError::Bus(cause));
            }
        }
        done(unit, false);
    }
}

impl<U, F> Drop for PendingCompletion<U, F>
where
    U: InboundUnit,
    F: FnOnce(U, bool),
{
    fn drop(&mut self) {
        let Some((mut unit, done)) = self.slot.take() else {
            return;
        };
        self.metrics.record_reply_failure();
        warn!(
            exchange_id = unit.id(),
            address = %self.address,
            "Reply handler dropped before it ran, unit marked failed"
        );
        unit.set_failure(BridgeError::Bus(BusError::ReplyDropped {
            address: std::mem::take(&mut self.address),
        }));
        done(unit, false);
    }
}

/// Processor that bridges one routing endpoint to one bus address
pub struct BridgeProcessor<B: MessageBus> {
    bus: B,
    mapping: InboundMapping,
    /// Read once from settings at construction
    send_timeout: Duration,
    metrics: Arc<BridgeMetrics>,
}

impl<B: MessageBus> BridgeProcessor<B> {
    /// Create a processor for `mapping`
    ///
    /// The send timeout is taken from `settings` here and never re-read.
    pub fn new(bus: B, mapping: InboundMapping, settings: &BridgeSettings) -> Result<Self, ConfigError> {
        mapping.validate()?;

        debug!(
            uri = %mapping.uri,
            address = %mapping.address,
            mode = ?mapping.delivery_mode(),
            send_timeout_ms = settings.send_timeout_ms(),
            "Bridge processor created"
        );

        Ok(Self {
            bus,
            mapping,
            send_timeout: settings.send_timeout(),
            metrics: Arc::new(BridgeMetrics::new()),
        })
    }

    /// Share a metrics collector with other processors
    pub fn with_metrics(mut self, metrics: Arc<BridgeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn mapping(&self) -> &InboundMapping {
        &self.mapping
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    fn prepare<U: InboundUnit>(&self, unit: &U) -> Result<(Body, DeliveryOptions), ConversionError> {
        let body = convert_body(unit.body(), self.mapping.body_type)?;
        let options = delivery_options(unit.headers(), self.mapping.headers_copy, self.send_timeout);
        Ok((body, options))
    }

    fn dispatch<U: InboundUnit>(&self, unit: &U) -> Result<Dispatch, BridgeError> {
        let (body, options) = self.prepare(unit)?;
        let address = self.mapping.address.as_str();

        match self.mapping.delivery_mode() {
            DeliveryMode::Publish => {
                self.bus.publish(address, body, &options)?;
                self.metrics.record_published();
                debug!(exchange_id = unit.id(), address = address, "Unit published");
                Ok(Dispatch::Completed)
            }
            DeliveryMode::PointToPoint if unit.supports_response() => {
                let handle = self.bus.request(address, body, &options)?;
                self.metrics.record_requested();
                debug!(exchange_id = unit.id(), address = address, "Unit sent, awaiting reply");
                Ok(Dispatch::AwaitingReply(handle))
            }
            DeliveryMode::PointToPoint => {
                self.bus.send(address, body, &options)?;
                self.metrics.record_sent();
                debug!(exchange_id = unit.id(), address = address, "Unit sent, no reply expected");
                Ok(Dispatch::Completed)
            }
        }
    }
}

impl<B: MessageBus, U: InboundUnit> AsyncProcessor<U> for BridgeProcessor<B> {
    fn process_async<F>(&self, mut unit: U, done: F) -> bool
    where
        F: FnOnce(U, bool) + Send + 'static,
    {
        match self.dispatch(&unit) {
            Ok(Dispatch::Completed) => {}
            Ok(Dispatch::AwaitingReply(handle)) => {
                let pending = PendingCompletion::new(
                    unit,
                    done,
                    &self.mapping.address,
                    Arc::clone(&self.metrics),
                );
                let _ = handle.on_complete(move |result| pending.finish(result));
                return false;
            }
            Err(cause) => {
                self.metrics.record_sync_failure();
                warn!(
                    exchange_id = unit.id(),
                    address = %self.mapping.address,
                    error = %cause,
                    "Unit failed before reaching the bus"
                );
                unit.set_failure(cause);
            }
        }

        done(unit, true);
        true
    }
}

#[async_trait]
impl<B: MessageBus, U: InboundUnit> Processor<U> for BridgeProcessor<B> {
    async fn process(&self, unit: U) -> Result<U, BridgeError> {
        let (tx, rx) = oneshot::channel();
        <Self as AsyncProcessor<U>>::process_async(self, unit, move |unit, _sync| {
            let _ = tx.send(unit);
        });
        rx.await.map_err(|_| BridgeError::CompletionDropped)
    }
}
