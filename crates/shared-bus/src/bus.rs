//! # Message Bus
//!
//! Defines the sending side of the message bus and its in-memory
//! implementation.

use crate::consumer::{AddressHandlers, Consumer, Delivery, Registry};
use crate::error::BusError;
use crate::message::Body;
use crate::options::DeliveryOptions;
use crate::reply::ReplyHandle;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Port for sending messages to addresses on the bus.
///
/// All operations are non-blocking. Errors returned here are synchronous
/// (nothing was delivered); reply failures arrive through the
/// [`ReplyHandle`].
pub trait MessageBus: Send + Sync {
    /// Deliver to every consumer registered at `address`.
    fn publish(&self, address: &str, body: Body, options: &DeliveryOptions)
        -> Result<(), BusError>;

    /// Deliver to exactly one consumer at `address`, without a reply.
    fn send(&self, address: &str, body: Body, options: &DeliveryOptions) -> Result<(), BusError>;

    /// Deliver to exactly one consumer at `address` and wait for its reply.
    fn request(
        &self,
        address: &str,
        body: Body,
        options: &DeliveryOptions,
    ) -> Result<ReplyHandle, BusError>;
}

impl<T: MessageBus + ?Sized> MessageBus for Arc<T> {
    fn publish(
        &self,
        address: &str,
        body: Body,
        options: &DeliveryOptions,
    ) -> Result<(), BusError> {
        (**self).publish(address, body, options)
    }

    fn send(&self, address: &str, body: Body, options: &DeliveryOptions) -> Result<(), BusError> {
        (**self).send(address, body, options)
    }

    fn request(
        &self,
        address: &str,
        body: Body,
        options: &DeliveryOptions,
    ) -> Result<ReplyHandle, BusError> {
        (**self).request(address, body, options)
    }
}

/// In-memory implementation of the message bus.
///
/// Each consumer owns a bounded `tokio::sync::mpsc` queue. Publish fans out
/// to every consumer at the address; send and request pick one consumer
/// round-robin. Suitable for single-process operation; a clustered
/// deployment would put a network transport behind [`MessageBus`].
pub struct InMemoryMessageBus {
    /// Address registry shared with consumers.
    registry: Arc<Registry>,

    /// Per-consumer queue capacity.
    capacity: usize,

    /// Total publish calls accepted.
    messages_published: AtomicU64,

    /// Total point-to-point sends accepted.
    messages_sent: AtomicU64,

    /// Total requests issued.
    requests_issued: AtomicU64,
}

impl InMemoryMessageBus {
    /// Create a new in-memory bus with default queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified per-consumer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            capacity: capacity.max(1),
            messages_published: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            requests_issued: AtomicU64::new(0),
        }
    }

    /// Register a consumer at `address`.
    pub fn consumer(&self, address: &str) -> Result<Consumer, BusError> {
        self.check_open(address)?;

        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = self.registry.register(address, sender);

        debug!(address = address, consumer_id = id, "New consumer registered");

        Ok(Consumer::new(id, address, receiver, self.registry.clone()))
    }

    /// Number of consumers registered at `address`.
    #[must_use]
    pub fn consumer_count(&self, address: &str) -> usize {
        self.registry.handler_count(address)
    }

    /// Close the bus. Consumers drain what is queued and then end.
    pub fn close(&self) {
        self.registry.close();
        debug!("Message bus closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.registry.is_closed()
    }

    /// Per-consumer queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued.load(Ordering::Relaxed)
    }

    fn check_open(&self, address: &str) -> Result<(), BusError> {
        if self.registry.is_closed() {
            return Err(BusError::Closed);
        }
        if address.trim().is_empty() {
            return Err(BusError::InvalidAddress(address.to_string()));
        }
        Ok(())
    }

    /// Hand `delivery` to one live consumer at `address`.
    ///
    /// Returns the delivery back when no consumer could take it.
    fn deliver_one(&self, address: &str, delivery: Delivery) -> Result<Option<Delivery>, BusError> {
        let addresses = self
            .registry
            .addresses
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(AddressHandlers { handlers, cursor }) = addresses.get(address) else {
            return Ok(Some(delivery));
        };

        let count = handlers.len();
        let start = cursor.fetch_add(1, Ordering::Relaxed);
        let mut delivery = delivery;

        for offset in 0..count {
            let handler = &handlers[start.wrapping_add(offset) % count];
            match handler.sender.try_send(delivery) {
                Ok(()) => return Ok(None),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    return Err(BusError::QueueFull {
                        address: address.to_string(),
                    })
                }
                // Consumer is being dropped; try the next one.
                Err(mpsc::error::TrySendError::Closed(returned)) => delivery = returned,
            }
        }

        Ok(Some(delivery))
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for InMemoryMessageBus {
    fn publish(
        &self,
        address: &str,
        body: Body,
        options: &DeliveryOptions,
    ) -> Result<(), BusError> {
        self.check_open(address)?;
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let addresses = self
            .registry
            .addresses
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = addresses.get(address) else {
            warn!(address = address, "Message dropped (no consumers)");
            return Ok(());
        };

        let mut receivers = 0usize;
        for handler in &entry.handlers {
            let delivery = Delivery::new(address, body.clone(), options.headers().clone(), None);
            match handler.sender.try_send(delivery) {
                Ok(()) => receivers += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        address = address,
                        consumer_id = handler.id,
                        "Published message dropped for lagging consumer"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        debug!(
            address = address,
            body = body.kind(),
            receivers = receivers,
            "Message published"
        );
        Ok(())
    }

    fn send(&self, address: &str, body: Body, options: &DeliveryOptions) -> Result<(), BusError> {
        self.check_open(address)?;

        let delivery = Delivery::new(address, body, options.headers().clone(), None);
        if self.deliver_one(address, delivery)?.is_some() {
            warn!(address = address, "Message dropped (no consumers)");
        } else {
            debug!(address = address, "Message sent");
        }
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn request(
        &self,
        address: &str,
        body: Body,
        options: &DeliveryOptions,
    ) -> Result<ReplyHandle, BusError> {
        self.check_open(address)?;
        let runtime = Handle::try_current().map_err(|_| BusError::NoRuntime)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let delivery = Delivery::new(address, body, options.headers().clone(), Some(reply_tx));
        let handle = ReplyHandle::new(address, reply_rx, options.send_timeout(), runtime);

        if let Some(undelivered) = self.deliver_one(address, delivery)? {
            debug!(address = address, "Request has no consumers");
            // The reply slot travels with the delivery; fail it directly.
            let _ = undelivered.fail_no_handlers();
        } else {
            debug!(
                address = address,
                timeout_ms = u64::try_from(options.send_timeout().as_millis()).unwrap_or(u64::MAX),
                "Request sent, awaiting reply"
            );
        }

        self.requests_issued.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }
}
