//! Frame dispatch router.
//!
//! Receives raw frames from the transport's delivery loop, decodes them,
//! and fans out to the listeners registered for the decoded kind.
//!
//! # Guarantees
//!
//! - Frames are dispatched in transport delivery order; the router never
//!   reorders. Each listener's queue preserves that order.
//! - A malformed frame is dropped and logged, never surfaced to listeners
//!   and never fatal to the delivery loop.
//! - No buffering or replay: a listener registered after a frame arrived
//!   never receives that frame.
//! - Once the owning client begins closing, no new dispatch starts.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{trace, warn};

use crate::protocol::{DecodeError, EventFrame, decode};

use super::registry::SubscriptionRegistry;

// ============================================================================
// DispatchRouter
// ============================================================================

/// Routes decoded events from the transport to registered listeners.
pub(crate) struct DispatchRouter {
    registry: Arc<SubscriptionRegistry>,
    closed: Arc<AtomicBool>,
}

impl DispatchRouter {
    /// Creates a router over a registry, gated by the client's closed flag.
    pub(crate) fn new(registry: Arc<SubscriptionRegistry>, closed: Arc<AtomicBool>) -> Self {
        Self { registry, closed }
    }

    /// Handles one inbound frame.
    ///
    /// Invoked by the transport for every event frame, on the transport's
    /// delivery context. Must not block: delivery to listeners is a
    /// non-blocking send into each listener's queue.
    pub(crate) fn on_frame(&self, frame: EventFrame) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        let event = match decode(&frame) {
            Ok(event) => event,
            Err(DecodeError::UnknownMethod { method }) => {
                trace!(%method, "Ignoring frame outside the network event set");
                return;
            }
            Err(err) => {
                warn!(method = %frame.method, error = %err, "Dropping malformed event frame");
                return;
            }
        };

        let targets = self.registry.snapshot(event.kind());
        if targets.is_empty() {
            trace!(kind = %event.kind(), "No listeners registered for event");
            return;
        }

        // A failed send means that listener was unregistered between the
        // snapshot and the send; skipping it is the correct resolution.
        for tx in &targets {
            let _ = tx.send(event.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;
    use tokio::time::timeout;

    use crate::protocol::EventKind;

    fn request_frame(request_id: &str) -> EventFrame {
        EventFrame::new(
            "network.beforeRequestSent",
            json!({
                "context": "window-1",
                "request": { "request": request_id, "url": "http://x/", "method": "GET" }
            }),
        )
    }

    fn router_fixture() -> (DispatchRouter, Arc<SubscriptionRegistry>, Arc<AtomicBool>) {
        let registry = Arc::new(SubscriptionRegistry::new());
        let closed = Arc::new(AtomicBool::new(false));
        let router = DispatchRouter::new(Arc::clone(&registry), Arc::clone(&closed));
        (router, registry, closed)
    }

    #[tokio::test]
    async fn test_dispatches_to_every_listener() {
        let (router, registry, _closed) = router_fixture();

        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx_a.send(event).ok();
        });
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx_b.send(event).ok();
        });

        router.on_frame(request_frame("req-7"));

        let a = timeout(Duration::from_secs(1), rx_a.recv())
            .await
            .expect("delivery a")
            .expect("channel open");
        let b = timeout(Duration::from_secs(1), rx_b.recv())
            .await
            .expect("delivery b")
            .expect("channel open");

        assert_eq!(a, b);
        assert_eq!(a.request().request_id, "req-7");
    }

    #[tokio::test]
    async fn test_malformed_frame_is_isolated() {
        let (router, registry, _closed) = router_fixture();

        let (tx, mut rx) = unbounded_channel();
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx.send(event).ok();
        });

        // Missing requestId: dropped without delivery or panic.
        router.on_frame(EventFrame::new(
            "network.beforeRequestSent",
            json!({ "context": "window-1", "request": { "url": "http://x/", "method": "GET" } }),
        ));

        // A later well-formed frame still dispatches.
        router.on_frame(request_frame("req-8"));

        let delivered = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("delivery")
            .expect("channel open");
        assert_eq!(delivered.request().request_id, "req-8");
    }

    #[tokio::test]
    async fn test_unknown_method_is_ignored() {
        let (router, registry, _closed) = router_fixture();

        let (tx, mut rx) = unbounded_channel();
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx.send(event).ok();
        });

        router.on_frame(EventFrame::new("log.entryAdded", json!({ "text": "hi" })));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_dispatch_after_close() {
        let (router, registry, closed) = router_fixture();

        let (tx, mut rx) = unbounded_channel();
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx.send(event).ok();
        });

        closed.store(true, Ordering::Release);
        router.on_frame(request_frame("req-9"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_preserves_frame_order_per_listener() {
        let (router, registry, _closed) = router_fixture();

        let (tx, mut rx) = unbounded_channel();
        registry.register(EventKind::BeforeRequestSent, move |event| {
            tx.send(event.request().request_id.clone()).ok();
        });

        for i in 0..5 {
            router.on_frame(request_frame(&format!("req-{i}")));
        }

        for i in 0..5 {
            let id = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("delivery")
                .expect("channel open");
            assert_eq!(id, format!("req-{i}"));
        }
    }
}
