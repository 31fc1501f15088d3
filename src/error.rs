//! Error types for the BiDi network client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bidi_network::{NetworkClient, Result};
//!
//! async fn example(client: &NetworkClient) -> Result<()> {
//!     let handle = client.on_before_request_sent(|event| {
//!         println!("{} {}", event.request.method, event.request.url);
//!     }).await?;
//!     client.unsubscribe(handle).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Session | [`Error::SessionClosed`] |
//! | Transport | [`Error::Transport`], [`Error::CommandTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::CommandFailed`] |
//! | External | [`Error::Json`] |
//!
//! Decode failures for inbound event frames are a separate, locally-recovered
//! taxonomy: see [`DecodeError`](crate::protocol::DecodeError). They are never
//! surfaced to listeners or callers.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Underlying browsing session has ended.
    ///
    /// Returned when registering listeners or closing a client whose
    /// session was torn down externally (e.g. the browser quit).
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport-level failure sending a command.
    ///
    /// Returned when the underlying transport cannot deliver a command.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Command round-trip timed out.
    ///
    /// Returned when a command acknowledgement is not received within
    /// the transport's bounded wait.
    #[error("Command {method} timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// Command method that timed out.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Transport connection closed unexpectedly.
    ///
    /// Returned when the connection is lost during operation.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Remote end rejected a command.
    ///
    /// Returned when the remote end acknowledges a command with an error.
    #[error("Command failed: {error}: {message}")]
    CommandFailed {
        /// Protocol error code.
        error: String,
        /// Human-readable error message.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            method: method.into(),
            timeout_ms,
        }
    }

    /// Creates a command failed error.
    #[inline]
    pub fn command_failed(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            error: error.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. })
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::CommandTimeout { .. } | Self::ConnectionClosed
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. } | Self::Transport { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
