//! BiDi network event subscription client.
//!
//! This library attaches to a single browser automation session and
//! subscribes to the WebDriver BiDi network domain's lifecycle events
//! (`beforeRequestSent`, `responseStarted`, `responseCompleted`),
//! demultiplexing them to caller-registered listeners.
//!
//! # Architecture
//!
//! The client sits between two opaque collaborators:
//!
//! - **[`BrowsingSession`]**: the automation driver session, which only
//!   needs to expose its browsing-context ID and liveness.
//! - **[`ProtocolTransport`]**: the bidirectional connection, which carries
//!   command round-trips and delivers unsolicited event frames.
//!
//! Inside, frames flow transport → decoder → router → per-listener queue →
//! listener callback. Each listener runs on its own worker task, so a slow
//! or panicking listener never stalls siblings or the delivery loop, and
//! each listener observes events in frame-arrival order.
//!
//! The "network events enabled" state is session-scoped and
//! reference-counted: the enable command (`session.subscribe`) is sent on
//! the first registration across all clients of a session, the disable
//! command on the last teardown.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bidi_network::{BrowsingSession, NetworkClient, ProtocolTransport, Result};
//!
//! async fn watch(
//!     session: Arc<dyn BrowsingSession>,
//!     transport: Arc<dyn ProtocolTransport>,
//! ) -> Result<()> {
//!     let client = NetworkClient::new(session, transport);
//!
//!     client.on_before_request_sent(|event| {
//!         println!("{} {}", event.request.method, event.request.url);
//!     }).await?;
//!
//!     client.on_response_completed(|event| {
//!         println!("{} -> {}", event.response_data.url, event.response_data.status);
//!     }).await?;
//!
//!     // ... drive the browser ...
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`network`] | The client facade and listener registry |
//! | [`protocol`] | Frame, event, and command types |
//! | [`session`] | Browsing session capability |
//! | [`transport`] | Protocol transport capability |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// The network event client: facade, registry, router, domain refcount.
pub mod network;

/// BiDi protocol message types: frames, events, commands.
pub mod protocol;

/// Browsing session capability trait.
pub mod session;

/// Protocol transport capability trait.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::SubscriptionId;

// Client types
pub use network::{NetworkClient, SubscriptionHandle, SubscriptionRegistry};

// Protocol types
pub use protocol::{
    BeforeRequestSent, BytesValue, Cookie, DecodeError, EventFrame, EventKind, Header, Initiator,
    InitiatorType, NetworkEvent, RequestData, ResponseData, ResponseDetails, SessionCommand,
};

// Capability traits
pub use session::BrowsingSession;
pub use transport::{FrameHandler, ProtocolTransport};
