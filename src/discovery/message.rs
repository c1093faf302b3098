//! # Messages exchanged between identities.
//!
//! ```text
//! connector                              acceptor
//!   ConnectRequest { from, reply } ──► Address
//!   Option<Connection>            ◄── reply conduit
//!   RequestEnvelope { req, reply } ──► Connection::requests
//!   Res                           ◄── reply conduit
//! ```
//!
//! Payloads are opaque: a [`Payload`] is a shared, type-erased value that the
//! receiving side downcasts to whatever type the two parties agreed on via
//! the `kind` tag.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::pool::ConduitSender;

/// Type-erased, cheaply cloneable message payload.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the value if it is a `T`.
    ///
    /// ```
    /// use cohort::Payload;
    ///
    /// let p = Payload::new(String::from("hello"));
    /// assert_eq!(p.downcast_ref::<String>().map(String::as_str), Some("hello"));
    /// assert!(p.downcast_ref::<u32>().is_none());
    /// ```
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// A request: type tag plus opaque payload.
#[derive(Clone, Debug, Default)]
pub struct Req {
    /// Type tag describing the payload.
    pub kind: String,
    /// Opaque payload.
    pub payload: Option<Payload>,
}

impl Req {
    /// Creates a request with the given tag and payload.
    pub fn new(kind: impl Into<String>, payload: Payload) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    /// Returns the payload downcast to `T`, if present and of that type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(Payload::downcast_ref::<T>)
    }
}

/// Outcome classification of a [`Res`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// Handler did not set a status.
    #[default]
    Unknown,
    /// Request handled.
    Success,
    /// Handler failed (or panicked, or the request could not be delivered).
    Error,
    /// No response arrived within the send timeout.
    RequestTimeout,
}

/// A response.
#[derive(Clone, Debug, Default)]
pub struct Res {
    /// Outcome.
    pub status: Status,
    /// Type tag describing the payload.
    pub kind: String,
    /// Opaque payload.
    pub payload: Option<Payload>,
    /// Error detail when `status` is not [`Status::Success`].
    pub error: Option<String>,
}

impl Res {
    /// Successful response carrying `payload`.
    pub fn success(kind: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            status: Status::Success,
            kind: kind.into(),
            payload,
            error: None,
        }
    }

    /// Error response with a descriptive message and no payload.
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: Some(detail.into()),
            ..Self::default()
        }
    }

    /// Response returned by `send` when the response did not arrive in time.
    pub fn timeout() -> Self {
        Self {
            status: Status::RequestTimeout,
            error: Some("timeout".to_string()),
            ..Self::default()
        }
    }

    /// Returns the payload downcast to `T`, if present and of that type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(Payload::downcast_ref::<T>)
    }
}

/// A request travelling to a handling loop with the conduit for its response.
#[derive(Debug)]
pub struct RequestEnvelope {
    pub(crate) req: Req,
    pub(crate) reply: ConduitSender<Res>,
}

/// First message of the handshake: who is connecting and where to reply.
#[derive(Debug)]
pub struct ConnectRequest {
    pub(crate) from: String,
    pub(crate) reply: ConduitSender<Option<Connection>>,
}

impl ConnectRequest {
    /// Name of the requesting identity.
    pub fn from(&self) -> &str {
        &self.from
    }
}

/// Result of a successful handshake.
///
/// Holds the request conduit dedicated to this connection. Dropping every
/// clone ends the remote handling loop and lets it recycle the conduit.
#[derive(Clone, Debug)]
pub struct Connection {
    pub(crate) requests: ConduitSender<RequestEnvelope>,
    pub(crate) timeout: Duration,
}

impl Connection {
    /// Idle timeout after which the remote drops this connection.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True once the remote handling loop has gone away.
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

/// Inbound conduit of an identity; accepts [`ConnectRequest`]s.
#[derive(Clone, Debug)]
pub struct Address(pub(crate) mpsc::Sender<ConnectRequest>);

impl Address {
    /// True if the owning identity no longer exists.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}
