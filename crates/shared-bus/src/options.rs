//! Per-message delivery options.

use crate::message::MultiMap;
use std::time::Duration;

/// Default time to wait for a reply before failing the request.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Options attached to a single publish, send or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    send_timeout: Duration,
    headers: MultiMap,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            headers: MultiMap::new(),
        }
    }
}

impl DeliveryOptions {
    /// Options with the default timeout and no headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply timeout used by request-reply.
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub fn set_send_timeout(&mut self, timeout: Duration) {
        self.send_timeout = timeout;
    }

    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Headers delivered with the message.
    #[must_use]
    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut MultiMap {
        &mut self.headers
    }

    #[must_use]
    pub fn with_headers(mut self, headers: MultiMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.add(name, value);
    }
}
