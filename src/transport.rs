//! Protocol transport capability.
//!
//! Message framing and connection establishment are outside this crate.
//! The network client drives the transport through two surfaces:
//!
//! - Command round-trips (`session.subscribe` / `session.unsubscribe`),
//!   acknowledged or failed within the transport's bounded wait.
//! - An unsolicited event-frame stream, delivered to a registered
//!   [`FrameHandler`] on the transport's own delivery task(s).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::EventFrame;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for every inbound event frame.
///
/// The transport calls the handler in frame-arrival order for a single
/// session. Handlers must not block the delivery loop.
pub type FrameHandler = Arc<dyn Fn(EventFrame) + Send + Sync>;

// ============================================================================
// ProtocolTransport
// ============================================================================

/// Capability exposed by the bidirectional transport.
///
/// Implementations wrap one protocol connection (typically a WebSocket) and
/// are shared across clients via `Arc`.
#[async_trait]
pub trait ProtocolTransport: Send + Sync {
    /// Sends a command and waits for its acknowledgement.
    ///
    /// The wait is bounded by the transport.
    ///
    /// # Errors
    ///
    /// - [`Error::CommandTimeout`](crate::Error::CommandTimeout) if no
    ///   acknowledgement arrives within the bounded wait
    /// - [`Error::Transport`](crate::Error::Transport) on delivery failure
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the
    ///   connection is gone
    /// - [`Error::CommandFailed`](crate::Error::CommandFailed) if the remote
    ///   end rejects the command
    async fn send_command(&self, method: &str, params: Value) -> Result<Value>;

    /// Registers the handler that receives unsolicited event frames.
    ///
    /// Replaces any previously registered handler.
    fn subscribe_frames(&self, handler: FrameHandler);

    /// Removes the registered frame handler, if any.
    fn unsubscribe_frames(&self);
}
