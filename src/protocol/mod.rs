//! BiDi protocol message types.
//!
//! This module defines the slice of the WebDriver BiDi protocol the network
//! client speaks: raw inbound event frames, the typed network-domain events
//! decoded from them, and the session commands used to enable and disable
//! event reporting.
//!
//! # Wire Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `session.subscribe` | Local → Remote | Enable network event reporting |
//! | `session.unsubscribe` | Local → Remote | Disable network event reporting |
//! | `network.beforeRequestSent` | Remote → Local | Request about to be sent |
//! | `network.responseStarted` | Remote → Local | Response headers received |
//! | `network.responseCompleted` | Remote → Local | Response fully received |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Session subscribe/unsubscribe command builders |
//! | `event` | Typed network events and the frame decoder |
//! | `frame` | Raw inbound event frame |

// ============================================================================
// Submodules
// ============================================================================

/// Session command builders.
pub mod command;

/// Typed network events and the frame decoder.
pub mod event;

/// Raw inbound event frame.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{SessionCommand, SubscriptionRequest};
pub use event::{
    BeforeRequestSent, BytesValue, Cookie, DecodeError, EventKind, Header, Initiator,
    InitiatorType, NetworkEvent, RequestData, ResponseData, ResponseDetails, decode,
};
pub use frame::EventFrame;
