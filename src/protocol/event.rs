//! Typed network events and the frame decoder.
//!
//! The BiDi network domain reports three lifecycle events per logical HTTP
//! exchange. All three carry the same `requestId` and browsing context and,
//! when all occur, arrive in this order:
//!
//! | Wire method | Typed event |
//! |-------------|-------------|
//! | `network.beforeRequestSent` | [`NetworkEvent::BeforeRequestSent`] |
//! | `network.responseStarted` | [`NetworkEvent::ResponseStarted`] |
//! | `network.responseCompleted` | [`NetworkEvent::ResponseCompleted`] |
//!
//! [`decode`] is a pure transform from a raw [`EventFrame`] into a
//! [`NetworkEvent`]. A single bad frame must never crash the dispatcher, so
//! failures are returned as [`DecodeError`] and handled (logged, dropped) by
//! the router.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use super::frame::EventFrame;

// ============================================================================
// EventKind
// ============================================================================

/// Discriminant for the three network event kinds.
///
/// Used as the registry key for listener sets and mapped 1:1 to the wire
/// method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A request is about to be sent.
    BeforeRequestSent,
    /// Response headers have been received.
    ResponseStarted,
    /// The response has been fully received.
    ResponseCompleted,
}

impl EventKind {
    /// All event kinds, in lifecycle order.
    pub const ALL: [EventKind; 3] = [
        EventKind::BeforeRequestSent,
        EventKind::ResponseStarted,
        EventKind::ResponseCompleted,
    ];

    /// Returns the wire method name for this kind.
    #[inline]
    #[must_use]
    pub fn method(self) -> &'static str {
        match self {
            Self::BeforeRequestSent => "network.beforeRequestSent",
            Self::ResponseStarted => "network.responseStarted",
            Self::ResponseCompleted => "network.responseCompleted",
        }
    }

    /// Maps a wire method name to an event kind.
    ///
    /// Returns `None` for methods outside the network event set.
    #[inline]
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "network.beforeRequestSent" => Some(Self::BeforeRequestSent),
            "network.responseStarted" => Some(Self::ResponseStarted),
            "network.responseCompleted" => Some(Self::ResponseCompleted),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

// ============================================================================
// BytesValue
// ============================================================================

/// A BiDi bytes value, carried as text or base64.
///
/// # Format
///
/// ```json
/// { "type": "string", "value": "bar" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BytesValue {
    /// UTF-8 text value.
    String {
        /// The text.
        value: String,
    },

    /// Base64-encoded binary value.
    Base64 {
        /// The base64 payload.
        value: String,
    },
}

impl BytesValue {
    /// Returns the raw carried value.
    ///
    /// For [`BytesValue::Base64`] this is the encoded form; decoding is the
    /// caller's concern.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::String { value } | Self::Base64 { value } => value,
        }
    }
}

// ============================================================================
// Cookie / Header
// ============================================================================

/// A cookie attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,

    /// Cookie value.
    pub value: BytesValue,
}

/// A single header, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,

    /// Header value.
    pub value: BytesValue,
}

// ============================================================================
// RequestData
// ============================================================================

/// Data describing the request half of an exchange.
///
/// Present on all three event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestData {
    /// Protocol-assigned request ID, unique per exchange within a session.
    ///
    /// Wire field is named `request`.
    #[serde(rename = "request")]
    pub request_id: String,

    /// Request URL.
    pub url: String,

    /// HTTP method. Compare case-insensitively.
    pub method: String,

    /// Cookies sent with the request, in wire order. May be empty.
    #[serde(default)]
    pub cookies: Vec<Cookie>,

    /// Request headers, in wire order.
    #[serde(default)]
    pub headers: Vec<Header>,
}

// ============================================================================
// ResponseData
// ============================================================================

/// Data describing the response half of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseData {
    /// Response URL (after redirects).
    pub url: String,

    /// HTTP status code.
    pub status: u16,

    /// Response headers, in wire order.
    #[serde(default)]
    pub headers: Vec<Header>,
}

// ============================================================================
// Initiator
// ============================================================================

/// What triggered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorType {
    /// Initiated by the HTML parser.
    Parser,
    /// Initiated by script.
    Script,
    /// CORS preflight.
    Preflight,
    /// Anything else (navigation, etc.).
    #[default]
    Other,
}

impl fmt::Display for InitiatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parser => "parser",
            Self::Script => "script",
            Self::Preflight => "preflight",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Request initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Initiator {
    /// Initiator type.
    #[serde(rename = "type", default)]
    pub initiator_type: InitiatorType,
}

// ============================================================================
// Typed Events
// ============================================================================

/// A `network.beforeRequestSent` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeforeRequestSent {
    /// Browsing context the request originated from.
    #[serde(rename = "context")]
    pub browsing_context_id: String,

    /// Request data.
    pub request: RequestData,

    /// Request initiator. Defaults to `other` when the remote end omits it.
    #[serde(default)]
    pub initiator: Initiator,
}

/// A `network.responseStarted` or `network.responseCompleted` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseDetails {
    /// Browsing context the request originated from.
    #[serde(rename = "context")]
    pub browsing_context_id: String,

    /// Request data.
    pub request: RequestData,

    /// Response data.
    #[serde(rename = "response")]
    pub response_data: ResponseData,
}

/// A decoded network event.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// A request is about to be sent.
    BeforeRequestSent(BeforeRequestSent),
    /// Response headers have been received.
    ResponseStarted(ResponseDetails),
    /// The response has been fully received.
    ResponseCompleted(ResponseDetails),
}

impl NetworkEvent {
    /// Returns the kind of this event.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeRequestSent(_) => EventKind::BeforeRequestSent,
            Self::ResponseStarted(_) => EventKind::ResponseStarted,
            Self::ResponseCompleted(_) => EventKind::ResponseCompleted,
        }
    }

    /// Returns the browsing context the event belongs to.
    #[inline]
    #[must_use]
    pub fn browsing_context_id(&self) -> &str {
        match self {
            Self::BeforeRequestSent(event) => &event.browsing_context_id,
            Self::ResponseStarted(event) | Self::ResponseCompleted(event) => {
                &event.browsing_context_id
            }
        }
    }

    /// Returns the request data common to all kinds.
    #[inline]
    #[must_use]
    pub fn request(&self) -> &RequestData {
        match self {
            Self::BeforeRequestSent(event) => &event.request,
            Self::ResponseStarted(event) | Self::ResponseCompleted(event) => &event.request,
        }
    }
}

// ============================================================================
// DecodeError
// ============================================================================

/// Failure decoding an inbound event frame.
///
/// Recovered locally by the router: the frame is dropped and logged, never
/// surfaced to listeners.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame payload is missing required fields or has the wrong shape.
    #[error("Malformed event: {message}")]
    MalformedEvent {
        /// What was wrong with the payload.
        message: String,
    },

    /// Frame method is not a network event.
    #[error("Unknown event method: {method}")]
    UnknownMethod {
        /// The unrecognized method.
        method: String,
    },
}

impl DecodeError {
    /// Creates a malformed event error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Decodes a raw frame into a typed network event.
///
/// Pure transform, no side effects.
///
/// # Errors
///
/// - [`DecodeError::UnknownMethod`] if the frame is not a network event
/// - [`DecodeError::MalformedEvent`] if required fields (`requestId`, `url`,
///   `method`) are missing or empty
pub fn decode(frame: &EventFrame) -> Result<NetworkEvent, DecodeError> {
    let kind = EventKind::from_method(&frame.method).ok_or_else(|| DecodeError::UnknownMethod {
        method: frame.method.clone(),
    })?;

    let event = match kind {
        EventKind::BeforeRequestSent => {
            let event: BeforeRequestSent = parse_params(frame)?;
            validate_request(&event.request)?;
            NetworkEvent::BeforeRequestSent(event)
        }
        EventKind::ResponseStarted => {
            let event: ResponseDetails = parse_params(frame)?;
            validate_request(&event.request)?;
            NetworkEvent::ResponseStarted(event)
        }
        EventKind::ResponseCompleted => {
            let event: ResponseDetails = parse_params(frame)?;
            validate_request(&event.request)?;
            NetworkEvent::ResponseCompleted(event)
        }
    };

    Ok(event)
}

/// Deserializes frame params into a typed payload.
fn parse_params<'de, T: Deserialize<'de>>(frame: &'de EventFrame) -> Result<T, DecodeError> {
    T::deserialize(&frame.params).map_err(|e| DecodeError::malformed(e.to_string()))
}

/// Rejects payloads whose required request fields are present but empty.
fn validate_request(request: &RequestData) -> Result<(), DecodeError> {
    if request.request_id.is_empty() {
        return Err(DecodeError::malformed("empty requestId"));
    }
    if request.url.is_empty() {
        return Err(DecodeError::malformed("empty url"));
    }
    if request.method.is_empty() {
        return Err(DecodeError::malformed("empty method"));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
