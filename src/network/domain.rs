//! Session-scoped network domain refcount.
//!
//! The "network events enabled" state belongs to the session, not to any
//! one client: several [`NetworkClient`](super::NetworkClient) instances may
//! attach to the same browsing context. The enable command must be issued on
//! the 0→1 transition only and the disable command on the 1→0 transition
//! only, so the state is reference-counted here and shared between clients
//! through a process-wide map keyed by context ID.
//!
//! The domain also owns the transport's frame stream. The transport carries
//! a single frame handler, so the domain installs one fan-out handler on the
//! 0→1 transition and removes it on 1→0; each client hands the domain its
//! router on acquire and receives a token identifying that attachment, so a
//! client tearing down removes only its own router while siblings keep
//! receiving frames.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::{EventFrame, SessionCommand};
use crate::transport::ProtocolTransport;

use super::router::DispatchRouter;

// ============================================================================
// Domain Map
// ============================================================================

/// Live domains by browsing-context ID.
///
/// Weak entries so a domain's lifetime is owned by its clients; stale
/// entries are pruned on lookup.
static DOMAINS: LazyLock<Mutex<FxHashMap<String, Weak<NetworkDomain>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

// ============================================================================
// NetworkDomain
// ============================================================================

/// Identifies one client's router attachment within a domain.
pub(crate) type RouterToken = u64;

/// Reference-counted "network domain enabled" flag for one context.
pub(crate) struct NetworkDomain {
    context: String,

    /// Number of clients currently holding the domain. The async lock is
    /// held across the enable/disable round-trip so concurrent transitions
    /// issue exactly one command.
    refcount: AsyncMutex<usize>,

    /// Routers of the attached clients, fed by the single fan-out handler
    /// installed on the transport while the refcount is non-zero.
    routers: Arc<Mutex<FxHashMap<RouterToken, Arc<DispatchRouter>>>>,

    next_token: AtomicU64,
}

impl NetworkDomain {
    /// Returns the shared domain for a browsing context, creating it on
    /// first use.
    pub(crate) fn for_context(context: &str) -> Arc<Self> {
        let mut domains = DOMAINS.lock();
        domains.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = domains.get(context).and_then(Weak::upgrade) {
            return existing;
        }

        let domain = Arc::new(Self {
            context: context.to_string(),
            refcount: AsyncMutex::new(0),
            routers: Arc::new(Mutex::new(FxHashMap::default())),
            next_token: AtomicU64::new(0),
        });
        domains.insert(context.to_string(), Arc::downgrade(&domain));
        domain
    }

    /// Takes one reference and attaches `router` to the frame stream. On
    /// the 0→1 transition the fan-out handler is installed and the enable
    /// command sent; the router is registered only once the command is
    /// acknowledged.
    ///
    /// On failure nothing remains attached, so a later acquire retries the
    /// enable from a clean slate.
    ///
    /// # Errors
    ///
    /// Propagates the transport error from the `session.subscribe`
    /// round-trip.
    pub(crate) async fn acquire(
        &self,
        transport: &Arc<dyn ProtocolTransport>,
        router: Arc<DispatchRouter>,
    ) -> Result<RouterToken> {
        let mut refcount = self.refcount.lock().await;

        if *refcount == 0 {
            let command = SessionCommand::subscribe_network(self.context.as_str());
            let params = command.params()?;

            // Attach before the round-trip so no frame arriving between the
            // browser's acknowledgement and our return is lost.
            let routers = Arc::clone(&self.routers);
            transport.subscribe_frames(Arc::new(move |frame: EventFrame| {
                let targets: Vec<_> = routers.lock().values().cloned().collect();
                for target in &targets {
                    target.on_frame(frame.clone());
                }
            }));

            if let Err(err) = transport.send_command(command.method(), params).await {
                // The router map is still empty at refcount zero.
                transport.unsubscribe_frames();
                return Err(err);
            }
            debug!(context = %self.context, "Network domain enabled");
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.routers.lock().insert(token, router);
        *refcount += 1;
        Ok(token)
    }

    /// Drops one reference and removes the router registered under `token`.
    /// On the 1→0 transition the fan-out handler is detached and the domain
    /// disabled.
    ///
    /// Best-effort teardown: command failures are logged, not returned.
    /// `send_disable` is `false` when the session is already gone and the
    /// command would be pointless.
    pub(crate) async fn release(
        &self,
        transport: &Arc<dyn ProtocolTransport>,
        token: RouterToken,
        send_disable: bool,
    ) {
        let mut refcount = self.refcount.lock().await;
        self.routers.lock().remove(&token);

        match *refcount {
            0 => warn!(context = %self.context, "Domain release without matching acquire"),
            1 => {
                *refcount = 0;
                transport.unsubscribe_frames();
                if send_disable {
                    self.send_unsubscribe(transport).await;
                }
            }
            n => *refcount = n - 1,
        }
    }

    async fn send_unsubscribe(&self, transport: &Arc<dyn ProtocolTransport>) {
        let command = SessionCommand::unsubscribe_network(self.context.as_str());
        let params = match command.params() {
            Ok(params) => params,
            Err(err) => {
                warn!(context = %self.context, error = %err, "Failed to build unsubscribe command");
                return;
            }
        };

        match transport.send_command(command.method(), params).await {
            Ok(_) => debug!(context = %self.context, "Network domain disabled"),
            Err(err) => {
                warn!(context = %self.context, error = %err, "Failed to disable network domain");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::error::Error;
    use crate::transport::FrameHandler;

    use super::super::registry::SubscriptionRegistry;

    #[derive(Default)]
    struct CountingTransport {
        subscribes: AtomicUsize,
        unsubscribes: AtomicUsize,
        fail_subscribe: AtomicBool,
        handler: Mutex<Option<FrameHandler>>,
    }

    impl CountingTransport {
        fn has_handler(&self) -> bool {
            self.handler.lock().is_some()
        }
    }

    #[async_trait]
    impl ProtocolTransport for CountingTransport {
        async fn send_command(&self, method: &str, _params: Value) -> Result<Value> {
            match method {
                "session.subscribe" => {
                    if self.fail_subscribe.load(Ordering::SeqCst) {
                        return Err(Error::command_timeout(method, 100));
                    }
                    self.subscribes.fetch_add(1, Ordering::SeqCst);
                }
                "session.unsubscribe" => {
                    self.unsubscribes.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
            Ok(json!({}))
        }

        fn subscribe_frames(&self, handler: FrameHandler) {
            *self.handler.lock() = Some(handler);
        }

        fn unsubscribe_frames(&self) {
            *self.handler.lock() = None;
        }
    }

    fn fixture(context: &str) -> (Arc<NetworkDomain>, Arc<CountingTransport>) {
        let domain = NetworkDomain::for_context(context);
        let transport = Arc::new(CountingTransport::default());
        (domain, transport)
    }

    fn as_dyn(transport: &Arc<CountingTransport>) -> Arc<dyn ProtocolTransport> {
        Arc::clone(transport) as Arc<dyn ProtocolTransport>
    }

    fn idle_router() -> Arc<DispatchRouter> {
        Arc::new(DispatchRouter::new(
            Arc::new(SubscriptionRegistry::new()),
            Arc::new(AtomicBool::new(false)),
        ))
    }

    #[test]
    fn test_enable_once_disable_once() {
        tokio_test::block_on(async {
            let (domain, transport) = fixture("domain-test-1");
            let dyn_transport = as_dyn(&transport);

            let first = domain
                .acquire(&dyn_transport, idle_router())
                .await
                .expect("first acquire");
            let second = domain
                .acquire(&dyn_transport, idle_router())
                .await
                .expect("second acquire");
            assert_eq!(transport.subscribes.load(Ordering::SeqCst), 1);
            assert!(transport.has_handler());

            domain.release(&dyn_transport, first, true).await;
            assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), 0);
            assert!(transport.has_handler());

            domain.release(&dyn_transport, second, true).await;
            assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), 1);
            assert!(!transport.has_handler());
        });
    }

    #[test]
    fn test_failed_enable_leaves_refcount_untouched() {
        tokio_test::block_on(async {
            let (domain, transport) = fixture("domain-test-2");
            let dyn_transport = as_dyn(&transport);

            transport.fail_subscribe.store(true, Ordering::SeqCst);
            let err = domain
                .acquire(&dyn_transport, idle_router())
                .await
                .expect_err("should fail");
            assert!(err.is_timeout());
            assert!(!transport.has_handler());

            // Retry succeeds and re-issues the enable command.
            transport.fail_subscribe.store(false, Ordering::SeqCst);
            domain
                .acquire(&dyn_transport, idle_router())
                .await
                .expect("retry");
            assert_eq!(transport.subscribes.load(Ordering::SeqCst), 1);
            assert!(transport.has_handler());
        });
    }

    #[test]
    fn test_release_without_session_skips_command() {
        tokio_test::block_on(async {
            let (domain, transport) = fixture("domain-test-3");
            let dyn_transport = as_dyn(&transport);

            let token = domain
                .acquire(&dyn_transport, idle_router())
                .await
                .expect("acquire");
            domain.release(&dyn_transport, token, false).await;
            assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), 0);
            // The frame stream is still detached locally.
            assert!(!transport.has_handler());
        });
    }

    #[test]
    fn test_same_context_shares_domain() {
        let a = NetworkDomain::for_context("domain-test-4");
        let b = NetworkDomain::for_context("domain-test-4");
        let c = NetworkDomain::for_context("domain-test-5");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
