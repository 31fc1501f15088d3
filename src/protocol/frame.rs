//! Raw inbound event frame.
//!
//! Events arrive unsolicited, out of band from command acknowledgements.
//! The transport hands them to the client as [`EventFrame`] values; the
//! decoder in [`event`](super::event) turns them into typed events.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// EventFrame
// ============================================================================

/// An unsolicited event frame from the remote end.
///
/// # Format
///
/// ```json
/// {
///   "type": "event",
///   "method": "network.beforeRequestSent",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EventFrame {
    /// Frame type marker (always "event").
    #[serde(rename = "type", default = "default_frame_type")]
    pub frame_type: String,

    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific payload.
    pub params: Value,
}

fn default_frame_type() -> String {
    "event".to_string()
}

impl EventFrame {
    /// Creates a frame from a method name and payload.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            frame_type: default_frame_type(),
            method: method.into(),
            params,
        }
    }

    /// Returns the module name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let frame = EventFrame::new("network.responseStarted", json!({}));
    /// assert_eq!(frame.module(), "network");
    /// ```
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_frame_deserialization() {
        let json_str = r#"{
            "type": "event",
            "method": "network.beforeRequestSent",
            "params": { "context": "window-1" }
        }"#;

        let frame: EventFrame = serde_json::from_str(json_str).expect("parse frame");
        assert_eq!(frame.frame_type, "event");
        assert_eq!(frame.module(), "network");
        assert_eq!(frame.event_name(), "beforeRequestSent");
        assert_eq!(
            frame.params.get("context").and_then(|v| v.as_str()),
            Some("window-1")
        );
    }

    #[test]
    fn test_frame_type_defaults_to_event() {
        let json_str = r#"{
            "method": "network.responseCompleted",
            "params": {}
        }"#;

        let frame: EventFrame = serde_json::from_str(json_str).expect("parse frame");
        assert_eq!(frame.frame_type, "event");
    }

    #[test]
    fn test_module_of_bare_method() {
        let frame = EventFrame::new("ping", json!({}));
        assert_eq!(frame.module(), "ping");
        assert_eq!(frame.event_name(), "");
    }
}
