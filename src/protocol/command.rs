//! Session command builders.
//!
//! The network client issues exactly two command round-trips over the
//! transport: `session.subscribe` to enable network event reporting for a
//! browsing context, and `session.unsubscribe` to disable it again.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

use super::event::EventKind;

// ============================================================================
// SubscriptionRequest
// ============================================================================

/// Parameters shared by `session.subscribe` and `session.unsubscribe`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    /// Event method names to (un)subscribe.
    pub events: Vec<String>,

    /// Browsing contexts the subscription is scoped to.
    pub contexts: Vec<String>,
}

impl SubscriptionRequest {
    /// Builds a request covering all network events for one context.
    #[must_use]
    pub fn network_events(context: impl Into<String>) -> Self {
        Self {
            events: EventKind::ALL.iter().map(|k| k.method().to_string()).collect(),
            contexts: vec![context.into()],
        }
    }
}

// ============================================================================
// SessionCommand
// ============================================================================

/// Session module commands.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Enable event reporting (`session.subscribe`).
    Subscribe(SubscriptionRequest),

    /// Disable event reporting (`session.unsubscribe`).
    Unsubscribe(SubscriptionRequest),
}

impl SessionCommand {
    /// Builds the subscribe command for all network events on one context.
    #[inline]
    #[must_use]
    pub fn subscribe_network(context: impl Into<String>) -> Self {
        Self::Subscribe(SubscriptionRequest::network_events(context))
    }

    /// Builds the unsubscribe command for all network events on one context.
    #[inline]
    #[must_use]
    pub fn unsubscribe_network(context: impl Into<String>) -> Self {
        Self::Unsubscribe(SubscriptionRequest::network_events(context))
    }

    /// Returns the wire method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "session.subscribe",
            Self::Unsubscribe(_) => "session.unsubscribe",
        }
    }

    /// Serializes the command parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn params(&self) -> Result<Value> {
        let request = match self {
            Self::Subscribe(request) | Self::Unsubscribe(request) => request,
        };
        Ok(serde_json::to_value(request)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
