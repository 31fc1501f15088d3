//! The public network client facade.
//!
//! [`NetworkClient`] attaches to one browsing session and one transport,
//! owns a listener registry, and manages the command round-trips that turn
//! the browser's network event reporting on and off.
//!
//! # Lifecycle
//!
//! - The first successful registration (across all kinds) attaches this
//!   client's router to the session's shared frame stream and enables the
//!   network domain, blocking the caller until the command is acknowledged
//!   or fails.
//! - Removing the last subscription, or calling [`NetworkClient::close`],
//!   detaches only this client's router and drops its domain reference;
//!   the disable command and the frame handler go away with the session's
//!   last reference, so siblings keep receiving events.
//! - `close` is idempotent; dropping an unclosed client performs the same
//!   teardown best-effort.
//!
//! # Example
//!
//! ```ignore
//! use bidi_network::NetworkClient;
//!
//! let client = NetworkClient::new(session, transport);
//! let handle = client.on_before_request_sent(|event| {
//!     println!("{} {}", event.request.method, event.request.url);
//! }).await?;
//!
//! // ... drive the browser ...
//!
//! client.close().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{BeforeRequestSent, EventKind, NetworkEvent, ResponseDetails};
use crate::session::BrowsingSession;
use crate::transport::ProtocolTransport;

use super::domain::{NetworkDomain, RouterToken};
use super::registry::{SubscriptionHandle, SubscriptionRegistry};
use super::router::DispatchRouter;

// ============================================================================
// ClientState
// ============================================================================

/// Mutable lifecycle state, serialized behind an async lock so the
/// enable/disable round-trips cannot interleave.
struct ClientState {
    /// Token for this client's router attachment, present while the client
    /// holds one reference on the session's domain.
    domain_token: Option<RouterToken>,
}

// ============================================================================
// NetworkClient
// ============================================================================

/// Subscription client for the BiDi network event domain.
///
/// One instance per attachment; multiple instances may share a session and
/// transport, in which case the underlying enable/disable commands are
/// reference-counted across them.
pub struct NetworkClient {
    session: Arc<dyn BrowsingSession>,
    transport: Arc<dyn ProtocolTransport>,
    registry: Arc<SubscriptionRegistry>,
    domain: Arc<NetworkDomain>,
    closed: Arc<AtomicBool>,
    state: AsyncMutex<ClientState>,
}

// ============================================================================
// NetworkClient - Constructor
// ============================================================================

impl NetworkClient {
    /// Creates a client attached to a session and transport.
    ///
    /// No commands are sent until the first listener is registered.
    #[must_use]
    pub fn new(session: Arc<dyn BrowsingSession>, transport: Arc<dyn ProtocolTransport>) -> Self {
        let domain = NetworkDomain::for_context(session.id());

        Self {
            session,
            transport,
            registry: Arc::new(SubscriptionRegistry::new()),
            domain,
            closed: Arc::new(AtomicBool::new(false)),
            state: AsyncMutex::new(ClientState { domain_token: None }),
        }
    }
}

// ============================================================================
// NetworkClient - Registration
// ============================================================================

impl NetworkClient {
    /// Registers a listener for `network.beforeRequestSent` events.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the client is closed or the session has
    ///   ended
    /// - Transport errors from the enable round-trip, in which case the
    ///   subscription set is left empty
    pub async fn on_before_request_sent<F>(&self, listener: F) -> Result<SubscriptionHandle>
    where
        F: Fn(BeforeRequestSent) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::BeforeRequestSent, move |event| {
            if let NetworkEvent::BeforeRequestSent(event) = event {
                listener(event);
            }
        })
        .await
    }

    /// Registers a listener for `network.responseStarted` events.
    ///
    /// # Errors
    ///
    /// Same as [`NetworkClient::on_before_request_sent`].
    pub async fn on_response_started<F>(&self, listener: F) -> Result<SubscriptionHandle>
    where
        F: Fn(ResponseDetails) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ResponseStarted, move |event| {
            if let NetworkEvent::ResponseStarted(event) = event {
                listener(event);
            }
        })
        .await
    }

    /// Registers a listener for `network.responseCompleted` events.
    ///
    /// # Errors
    ///
    /// Same as [`NetworkClient::on_before_request_sent`].
    pub async fn on_response_completed<F>(&self, listener: F) -> Result<SubscriptionHandle>
    where
        F: Fn(ResponseDetails) + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ResponseCompleted, move |event| {
            if let NetworkEvent::ResponseCompleted(event) = event {
                listener(event);
            }
        })
        .await
    }

    /// Registers an untyped listener for one event kind.
    ///
    /// The first successful registration across all kinds enables the
    /// network domain for this session's browsing context and blocks until
    /// the command is acknowledged. If the command fails, no listener is
    /// registered.
    ///
    /// # Errors
    ///
    /// Same as [`NetworkClient::on_before_request_sent`].
    pub async fn subscribe<F>(&self, kind: EventKind, listener: F) -> Result<SubscriptionHandle>
    where
        F: Fn(NetworkEvent) + Send + Sync + 'static,
    {
        self.ensure_live()?;

        let mut state = self.state.lock().await;
        self.ensure_live()?;

        if state.domain_token.is_none() {
            let router = Arc::new(DispatchRouter::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.closed),
            ));
            // On failure nothing was attached, so the client is back to its
            // pre-registration state and a later subscribe retries.
            let token = self.domain.acquire(&self.transport, router).await?;
            state.domain_token = Some(token);
        }

        let handle = self.registry.register(kind, listener);
        debug!(kind = %kind, subscription = %handle.id(), "Listener registered");
        Ok(handle)
    }

    /// Removes the listener identified by `handle`.
    ///
    /// Idempotent. When the last subscription is removed, this client's
    /// domain reference is released, which detaches its router; the disable
    /// command goes out with the session's last reference.
    ///
    /// # Errors
    ///
    /// Currently infallible; `Result` is kept for contract symmetry with
    /// registration.
    pub async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        let removed = self.registry.unregister(&handle);

        if removed && self.registry.is_empty() {
            if let Some(token) = state.domain_token.take() {
                self.domain
                    .release(&self.transport, token, self.session.is_open())
                    .await;
                debug!(context = %self.session.id(), "Last subscription removed");
            }
        }

        Ok(())
    }
}

// ============================================================================
// NetworkClient - Lifecycle
// ============================================================================

impl NetworkClient {
    /// Closes the client: removes all subscriptions and releases this
    /// client's domain reference, detaching its router from the shared
    /// frame stream. Sibling clients on the same session are unaffected.
    ///
    /// Safe to call multiple times; the second and later calls are no-ops.
    /// Teardown command failures are logged, not returned.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`] if the underlying session was torn down
    /// externally before this call. Local teardown still completes.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        self.registry.clear();

        let session_open = self.session.is_open();
        if let Some(token) = state.domain_token.take() {
            self.domain.release(&self.transport, token, session_open).await;
        }
        drop(state);

        debug!(context = %self.session.id(), "Network client closed");

        if session_open {
            Ok(())
        } else {
            Err(Error::SessionClosed)
        }
    }

    /// Returns `true` once the client has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) || !self.session.is_open() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
}

impl Drop for NetworkClient {
    /// Best-effort teardown for clients dropped without an explicit
    /// [`NetworkClient::close`].
    ///
    /// Dispatch stops immediately (the closed flag gates the router) and the
    /// domain reference is released from a spawned task when a runtime is
    /// available. Prefer calling `close()` so teardown completes before the
    /// scope exits.
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.registry.clear();

        let Ok(mut state) = self.state.try_lock() else {
            warn!(context = %self.session.id(), "Client dropped mid-operation, skipping teardown");
            return;
        };

        if let Some(token) = state.domain_token.take() {
            let domain = Arc::clone(&self.domain);
            let transport = Arc::clone(&self.transport);
            let send_disable = self.session.is_open();

            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    domain.release(&transport, token, send_disable).await;
                });
            } else {
                warn!(context = %self.session.id(), "Client dropped outside a runtime, domain reference leaked");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
