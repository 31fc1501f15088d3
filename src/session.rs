//! Browsing session capability.
//!
//! The automation driver itself (navigation, cookies, window management) is
//! outside this crate. The network client only needs to know which browsing
//! context it is attached to and whether that session is still alive, so the
//! driver is abstracted behind the [`BrowsingSession`] trait.

// ============================================================================
// BrowsingSession
// ============================================================================

/// Capability exposed by the browser automation driver.
///
/// One implementation wraps one live driver session. The network client
/// scopes its subscriptions to [`BrowsingSession::id`] and refuses to
/// operate once [`BrowsingSession::is_open`] reports the session has ended.
pub trait BrowsingSession: Send + Sync {
    /// Returns the browsing-context (window) identifier for this session.
    fn id(&self) -> &str;

    /// Returns `true` while the underlying session is alive.
    ///
    /// Once this returns `false` the session was torn down externally and
    /// registration or close calls fail with
    /// [`Error::SessionClosed`](crate::Error::SessionClosed).
    fn is_open(&self) -> bool;
}
