//! Single-shot reply handle for request-reply.

use crate::error::BusError;
use crate::message::BusMessage;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Pending reply to a request.
///
/// Resolves exactly once: either the consumer's reply or a failure
/// (`Timeout`, `NoHandlers`, `RecipientFailure`, `ReplyDropped`). The
/// timeout is enforced here, not by the requester.
#[must_use = "a reply handle does nothing unless awaited or given a completion handler"]
pub struct ReplyHandle {
    address: String,
    receiver: oneshot::Receiver<Result<BusMessage, BusError>>,
    timeout: Duration,
    runtime: Handle,
}

impl ReplyHandle {
    pub(crate) fn new(
        address: &str,
        receiver: oneshot::Receiver<Result<BusMessage, BusError>>,
        timeout: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            address: address.to_string(),
            receiver,
            timeout,
            runtime,
        }
    }

    /// Address the request was sent to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Timeout applied while waiting.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for the reply.
    pub async fn wait(self) -> Result<BusMessage, BusError> {
        let Self {
            address,
            receiver,
            timeout,
            ..
        } = self;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BusError::ReplyDropped { address }),
            Err(_) => Err(BusError::Timeout {
                address,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Run `handler` with the outcome on the bus runtime.
    ///
    /// Returns immediately; the handler runs exactly once on a task owned by
    /// the runtime the request was issued from.
    pub fn on_complete<F>(self, handler: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<BusMessage, BusError>) + Send + 'static,
    {
        let runtime = self.runtime.clone();
        runtime.spawn(async move { handler(self.wait().await) })
    }
}

impl std::fmt::Debug for ReplyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyHandle")
            .field("address", &self.address)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Body, MultiMap};

    fn handle(timeout: Duration) -> (oneshot::Sender<Result<BusMessage, BusError>>, ReplyHandle) {
        let (tx, rx) = oneshot::channel();
        let handle = ReplyHandle::new("svc", rx, timeout, Handle::current());
        (tx, handle)
    }

    #[tokio::test]
    async fn test_wait_returns_reply() {
        let (tx, handle) = handle(Duration::from_secs(1));
        tx.send(Ok(BusMessage::new("pong", MultiMap::new())))
            .expect("receiver alive");

        let reply = handle.wait().await.expect("reply");
        assert_eq!(reply.body, Body::from("pong"));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let (_tx, handle) = handle(Duration::from_millis(20));

        let result = handle.wait().await;
        assert_eq!(
            result,
            Err(BusError::Timeout {
                address: "svc".into(),
                timeout_ms: 20
            })
        );
    }

    #[tokio::test]
    async fn test_dropped_sender_fails() {
        let (tx, handle) = handle(Duration::from_secs(1));
        drop(tx);

        let result = handle.wait().await;
        assert_eq!(result, Err(BusError::ReplyDropped { address: "svc".into() }));
    }

    #[tokio::test]
    async fn test_on_complete_runs_handler_once() {
        let (tx, handle) = handle(Duration::from_secs(1));
        let (done_tx, done_rx) = oneshot::channel();

        let task = handle.on_complete(move |result| {
            let _ = done_tx.send(result.map(|reply| reply.body));
        });
        tx.send(Ok(BusMessage::new("ok", MultiMap::new())))
            .expect("receiver alive");

        task.await.expect("handler task");
        assert_eq!(done_rx.await.expect("handler ran"), Ok(Body::from("ok")));
    }
}
