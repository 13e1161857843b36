//! # Shared Bus - Address-Based Message Bus
//!
//! In-process message bus used by the bridge to reach its consumers.
//!
//! ## Delivery Modes
//!
//! ```text
//!                        publish()            ┌────────────┐
//!                   ┌───────────────────────▶ │ Consumer A │
//! ┌──────────┐      │                         └────────────┘
//! │  Sender  │ ─────┤                         ┌────────────┐
//! └──────────┘      └───────────────────────▶ │ Consumer B │
//!      │                                      └────────────┘
//!      │  send() / request()   one consumer,
//!      └──────────────────────▶ round-robin ──▶ reply (request only)
//! ```
//!
//! - **publish:** every consumer at the address receives a copy
//! - **send:** exactly one consumer receives it, no reply
//! - **request:** exactly one consumer receives it and answers through a
//!   single-shot [`ReplyHandle`]
//!
//! Addresses are plain strings. A message sent to an address with no
//! consumers is dropped with a warning; a request to such an address fails
//! its reply with [`BusError::NoHandlers`].

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod consumer;
pub mod error;
pub mod message;
pub mod options;
pub mod reply;

// Re-export main types
pub use bus::{InMemoryMessageBus, MessageBus};
pub use consumer::{Consumer, Delivery};
pub use error::BusError;
pub use message::{Body, BusMessage, MultiMap};
pub use options::{DeliveryOptions, DEFAULT_SEND_TIMEOUT};
pub use reply::ReplyHandle;

/// Maximum deliveries queued per consumer before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
