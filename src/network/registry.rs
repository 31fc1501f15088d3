//! Listener registry.
//!
//! Tracks active (event kind → listener set) bindings for one client.
//! Registration and removal are safe to call concurrently with dispatch:
//! the internal lock only guards the binding table, never a listener
//! invocation.
//!
//! # Listener Isolation
//!
//! Each registered listener owns an unbounded queue drained by a dedicated
//! worker task. Dispatch is a non-blocking channel send, so a slow listener
//! only backs up its own queue and every listener observes events in frame
//! order. A panic inside a listener is caught in its worker and reported,
//! never propagated to siblings or to the transport's delivery loop.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::identifiers::SubscriptionId;
use crate::protocol::{EventKind, NetworkEvent};

// ============================================================================
// SubscriptionHandle
// ============================================================================

/// Opaque token returned on listener registration.
///
/// Used to later remove exactly that listener. Removing an already-removed
/// handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    kind: EventKind,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    /// Returns the event kind this handle subscribes to.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the unique subscription ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

// ============================================================================
// ListenerSlot
// ============================================================================

/// One registered listener: its ID and the sending half of its queue.
///
/// Dropping the sender (on unregister/clear) lets the worker drain
/// already-queued events and exit.
struct ListenerSlot {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<NetworkEvent>,
}

// ============================================================================
// SubscriptionRegistry
// ============================================================================

/// Thread-safe listener registry for one client.
///
/// Must be used within a tokio runtime: [`SubscriptionRegistry::register`]
/// spawns the listener's worker task.
#[derive(Default)]
pub struct SubscriptionRegistry {
    slots: Mutex<FxHashMap<EventKind, Vec<ListenerSlot>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for an event kind.
    ///
    /// Spawns the listener's worker task and returns the handle used for
    /// removal. Multiple listeners per kind are legal; all receive every
    /// matching event.
    pub fn register<F>(&self, kind: EventKind, listener: F) -> SubscriptionHandle
    where
        F: Fn(NetworkEvent) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<NetworkEvent>();
        let id = SubscriptionId::generate();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                    error!(subscription = %id, "Listener panicked, continuing");
                }
            }
            debug!(subscription = %id, "Listener worker stopped");
        });

        self.slots
            .lock()
            .entry(kind)
            .or_default()
            .push(ListenerSlot { id, tx });

        SubscriptionHandle { kind, id }
    }

    /// Removes the listener identified by `handle`.
    ///
    /// Idempotent: returns `true` only if the listener was still registered.
    /// Already-queued events for that listener are still drained by its
    /// worker before it stops.
    pub fn unregister(&self, handle: &SubscriptionHandle) -> bool {
        let mut slots = self.slots.lock();
        let Some(list) = slots.get_mut(&handle.kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|slot| slot.id != handle.id);
        before != list.len()
    }

    /// Returns a consistent view of the senders registered for `kind`.
    ///
    /// The lock is released before the caller delivers to the snapshot, so a
    /// listener may re-register or unregister itself from inside its own
    /// callback without deadlocking.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<mpsc::UnboundedSender<NetworkEvent>> {
        self.slots
            .lock()
            .get(&kind)
            .map(|list| list.iter().map(|slot| slot.tx.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the total number of registered listeners across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.slots.lock().values().map(Vec::len).sum()
    }

    /// Returns `true` if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        self.slots.lock().clear();
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

    use crate::protocol::{EventFrame, decode};

    fn sample_event() -> NetworkEvent {
        let frame = EventFrame::new(
            "network.beforeRequestSent",
            json!({
                "context": "window-1",
                "request": { "request": "req-1", "url": "http://x/", "method": "GET" }
            }),
        );
        decode(&frame).expect("decode sample event")
    }

    #[test]
    fn test_register_and_total() {
        tokio_test::block_on(async {
            let registry = SubscriptionRegistry::new();
            assert!(registry.is_empty());

            let a = registry.register(EventKind::BeforeRequestSent, |_| {});
            let b = registry.register(EventKind::BeforeRequestSent, |_| {});
            let c = registry.register(EventKind::ResponseCompleted, |_| {});

            assert_eq!(registry.total(), 3);
            assert_ne!(a.id(), b.id());
            assert_eq!(c.kind(), EventKind::ResponseCompleted);
            assert_eq!(registry.snapshot(EventKind::BeforeRequestSent).len(), 2);
            assert_eq!(registry.snapshot(EventKind::ResponseStarted).len(), 0);
        });
    }

    #[test]
    fn test_unregister_is_idempotent() {
        tokio_test::block_on(async {
            let registry = SubscriptionRegistry::new();
            let handle = registry.register(EventKind::ResponseStarted, |_| {});

            assert!(registry.unregister(&handle));
            assert!(!registry.unregister(&handle));
            assert!(registry.is_empty());
        });
    }

    #[test]
    fn test_clear_removes_all() {
        tokio_test::block_on(async {
            let registry = SubscriptionRegistry::new();
            registry.register(EventKind::BeforeRequestSent, |_| {});
            registry.register(EventKind::ResponseCompleted, |_| {});

            registry.clear();
            assert!(registry.is_empty());
            assert!(registry.snapshot(EventKind::BeforeRequestSent).is_empty());
        });
    }

    #[test]
    fn test_worker_delivers_in_order() {
        tokio_test::block_on(async {
            let registry = SubscriptionRegistry::new();
            let (tx, mut rx) = unbounded_channel();

            registry.register(EventKind::BeforeRequestSent, move |event| {
                tx.send(event.request().request_id.clone()).ok();
            });

            let senders = registry.snapshot(EventKind::BeforeRequestSent);
            assert_eq!(senders.len(), 1);

            let mut first = sample_event();
            if let NetworkEvent::BeforeRequestSent(ref mut e) = first {
                e.request.request_id = "req-1".into();
            }
            let mut second = sample_event();
            if let NetworkEvent::BeforeRequestSent(ref mut e) = second {
                e.request.request_id = "req-2".into();
            }

            senders[0].send(first).expect("send first");
            senders[0].send(second).expect("send second");

            let got_first = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("first delivery")
                .expect("channel open");
            let got_second = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("second delivery")
                .expect("channel open");

            assert_eq!(got_first, "req-1");
            assert_eq!(got_second, "req-2");
        });
    }

    #[test]
    fn test_snapshot_survives_unregister_during_dispatch() {
        tokio_test::block_on(async {
            let registry = SubscriptionRegistry::new();
            let (tx, mut rx) = unbounded_channel();

            let handle = registry.register(EventKind::BeforeRequestSent, move |event| {
                tx.send(event).ok();
            });

            // Snapshot taken before removal still delivers queued events.
            let senders = registry.snapshot(EventKind::BeforeRequestSent);
            senders[0].send(sample_event()).expect("send");
            registry.unregister(&handle);

            let delivered = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("delivery")
                .expect("channel open");
            assert_eq!(delivered.request().request_id, "req-1");
        });
    }
}
