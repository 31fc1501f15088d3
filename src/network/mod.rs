//! Network event subscription client.
//!
//! This module composes the pieces of the client:
//!
//! - [`registry`] - thread-safe (event kind → listener set) bindings
//! - [`router`] - frame decoding and listener fan-out
//! - [`domain`] - session-scoped "network domain enabled" refcount
//! - [`client`] - the public [`NetworkClient`] facade
//!
//! Data flow: transport → router → per-listener queue → listener callback.
//! Control flow: caller → [`NetworkClient`] → registry + enable/disable
//! command round-trips.

// ============================================================================
// Submodules
// ============================================================================

/// The public client facade.
pub mod client;

/// Session-scoped network domain refcount.
pub(crate) mod domain;

/// Listener registry.
pub mod registry;

/// Frame dispatch router.
pub(crate) mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::NetworkClient;
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
