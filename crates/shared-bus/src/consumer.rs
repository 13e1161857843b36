//! # Message Consumer
//!
//! Defines the receiving side of the message bus.

use crate::error::BusError;
use crate::message::{Body, BusMessage, MultiMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

/// Channel half used to answer a request.
pub(crate) type ReplySender = oneshot::Sender<Result<BusMessage, BusError>>;

/// A message delivered to a consumer.
///
/// Deliveries produced by `request` carry a reply slot. Answer with
/// [`reply`](Self::reply) or [`fail`](Self::fail); dropping the delivery
/// without answering fails the request with `ReplyDropped`.
#[derive(Debug)]
pub struct Delivery {
    id: Uuid,
    address: String,
    body: Body,
    headers: MultiMap,
    reply: Option<ReplySender>,
}

impl Delivery {
    pub(crate) fn new(
        address: &str,
        body: Body,
        headers: MultiMap,
        reply: Option<ReplySender>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.to_string(),
            body,
            headers,
            reply,
        }
    }

    /// Unique id of this delivery (for log correlation).
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Address the message was sent to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    /// Whether the sender is waiting for a reply.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Answer the request.
    ///
    /// Returns `false` if no reply was expected or the requester already
    /// gave up (timed out).
    pub fn reply(mut self, body: impl Into<Body>, headers: MultiMap) -> bool {
        self.answer(Ok(BusMessage::new(body, headers)))
    }

    /// Fail the request with an application error code.
    pub fn fail(mut self, code: i32, message: impl Into<String>) -> bool {
        self.answer(Err(BusError::RecipientFailure {
            code,
            message: message.into(),
        }))
    }

    pub(crate) fn fail_no_handlers(mut self) -> bool {
        let address = self.address.clone();
        self.answer(Err(BusError::NoHandlers { address }))
    }

    fn answer(&mut self, result: Result<BusMessage, BusError>) -> bool {
        let Some(sender) = self.reply.take() else {
            debug!(delivery_id = %self.id, address = %self.address, "Reply ignored, none expected");
            return false;
        };
        sender.send(result).is_ok()
    }
}

/// Registered consumer channel.
pub(crate) struct Handler {
    pub(crate) id: u64,
    pub(crate) sender: mpsc::Sender<Delivery>,
}

/// Consumers registered at one address.
#[derive(Default)]
pub(crate) struct AddressHandlers {
    pub(crate) handlers: Vec<Handler>,
    /// Round-robin cursor for point-to-point delivery.
    pub(crate) cursor: AtomicUsize,
}

/// Address registry shared between the bus and its consumers.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) addresses: RwLock<HashMap<String, AddressHandlers>>,
    pub(crate) closed: AtomicBool,
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn register(&self, address: &str, sender: mpsc::Sender<Delivery>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut addresses = self
            .addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        addresses
            .entry(address.to_string())
            .or_default()
            .handlers
            .push(Handler { id, sender });
        id
    }

    pub(crate) fn unregister(&self, address: &str, id: u64) {
        let mut addresses = self
            .addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = addresses.get_mut(address) else {
            return;
        };
        entry.handlers.retain(|handler| handler.id != id);
        if entry.handlers.is_empty() {
            addresses.remove(address);
        }
    }

    pub(crate) fn handler_count(&self, address: &str) -> usize {
        self.addresses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .map_or(0, |entry| entry.handlers.len())
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the senders ends every consumer's stream.
        self.addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A consumer registered at one address.
///
/// When dropped, the consumer is unregistered from the bus.
pub struct Consumer {
    id: u64,
    address: String,
    receiver: mpsc::Receiver<Delivery>,
    registry: Arc<Registry>,
}

impl Consumer {
    pub(crate) fn new(
        id: u64,
        address: &str,
        receiver: mpsc::Receiver<Delivery>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            id,
            address: address.to_string(),
            receiver,
            registry,
        }
    }

    /// Address this consumer listens on.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Receive the next delivery.
    ///
    /// # Returns
    ///
    /// - `Some(delivery)` - The next message for this consumer
    /// - `None` - The bus was closed
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Try to receive the next delivery without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(delivery))` - A delivery was queued
    /// - `Ok(None)` - Nothing queued
    /// - `Err(BusError::Closed)` - The bus was closed
    pub fn try_recv(&mut self) -> Result<Option<Delivery>, BusError> {
        match self.receiver.try_recv() {
            Ok(delivery) => Ok(Some(delivery)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.registry.unregister(&self.address, self.id);
        debug!(address = %self.address, consumer_id = self.id, "Consumer dropped");
    }
}
