//! Error types for message bus operations.

use thiserror::Error;

/// Errors raised by the message bus.
///
/// Synchronous errors are returned from `publish`/`send`/`request` before
/// anything is delivered. Reply failures are delivered later through a
/// [`ReplyHandle`](crate::ReplyHandle).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The address was empty or otherwise unusable.
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    /// The bus was closed.
    #[error("Message bus closed")]
    Closed,

    /// The selected consumer could not accept more messages.
    #[error("Consumer queue full for address {address}")]
    QueueFull { address: String },

    /// No consumer is registered at the address.
    #[error("No handlers for address {address}")]
    NoHandlers { address: String },

    /// No reply arrived within the send timeout.
    #[error("Timed out after {timeout_ms}ms waiting for reply from {address}")]
    Timeout { address: String, timeout_ms: u64 },

    /// The consumer explicitly failed the request.
    #[error("Recipient failure ({code}): {message}")]
    RecipientFailure { code: i32, message: String },

    /// The consumer dropped the delivery without replying.
    #[error("Reply dropped by consumer at {address}")]
    ReplyDropped { address: String },

    /// Request-reply needs a tokio runtime to drive the reply.
    #[error("No tokio runtime available for request-reply")]
    NoRuntime,
}

impl BusError {
    /// Whether this error was produced while waiting for a reply.
    #[must_use]
    pub fn is_reply_failure(&self) -> bool {
        matches!(
            self,
            Self::NoHandlers { .. }
                | Self::Timeout { .. }
                | Self::RecipientFailure { .. }
                | Self::ReplyDropped { .. }
        )
    }
}
