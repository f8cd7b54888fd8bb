//! Error types for edb
//!
//! Every failure a caller can observe is one variant of [`Error`]. The
//! variants follow how far a call got before it failed:
//!
//! - **Transport**: the socket never opened, or closed/errored while the call
//!   was in flight. Broadcast to every pending caller.
//! - **Decode**: an inbound frame could not be understood, or a success
//!   payload did not match the method's result schema.
//! - **Remote**: the node answered this specific request with an error object.
//! - **Lifecycle**: `NotConnected`, `ClientClosed`, `AlreadyStarted`. No request
//!   was registered or sent.
//! - **Timeout**: the per-call deadline passed before a response arrived.
//!
//! # Examples
//!
//! ```rust
//! use edb_core::{Error, RemoteError};
//!
//! let error = Error::Remote(RemoteError::new(-32601, "Method not found"));
//! assert!(error.is_remote());
//! assert!(!error.is_transport());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for edb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for edb operations
///
/// `Clone` is required: a single transport failure is delivered to every
/// pending request when the connection drops.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Connection-level failure (never opened, closed, or errored)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Inbound frame or result payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The node reported a failure for this request
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A method was invoked before the client reached the open state
    #[error("Client is not connected")]
    NotConnected,

    /// The client has shut down and no longer accepts requests
    #[error("Client is closed")]
    ClientClosed,

    /// `start` was called on a client that already left the idle state
    #[error("Client was already started")]
    AlreadyStarted,

    /// The request deadline expired before a response arrived
    #[error("Request timeout")]
    Timeout,

    /// Outgoing parameters could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The endpoint URL cannot be used for a WebSocket connection
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// True for failures of the underlying connection
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when the node answered with an error object
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Decode(_) => "decode",
            Error::Remote(_) => "remote",
            Error::NotConnected => "not_connected",
            Error::ClientClosed => "client_closed",
            Error::AlreadyStarted => "already_started",
            Error::Timeout => "timeout",
            Error::Serialization(_) => "serialization",
            Error::InvalidEndpoint(_) => "invalid_endpoint",
        }
    }
}

/// Failure of the WebSocket connection itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("connect failed: {0}")]
    Connect(String),

    /// The connection was closed, by the peer or by this client
    #[error("connection closed (code: {code:?}, reason: {reason})")]
    Closed {
        /// WebSocket close code, when the peer sent one
        code: Option<u16>,
        /// Close reason text, possibly empty
        reason: String,
    },

    /// The socket reported an error while reading
    #[error("socket error: {0}")]
    Socket(String),

    /// A frame could not be written
    #[error("send failed: {0}")]
    Send(String),
}

/// Failure to interpret an inbound frame or result payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// The frame is JSON but not a valid response envelope
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The success payload does not match the expected result schema
    #[error("unexpected result shape: {0}")]
    Schema(String),
}

/// Error object reported by the node
///
/// This is the exact wire format found in the `error` field of a response.
///
/// # Examples
///
/// ```rust
/// use edb_core::RemoteError;
/// use serde_json::json;
///
/// let error = RemoteError::with_data(-32000, "Insufficient funds", json!({"balance": 0}));
/// assert_eq!(error.to_string(), "[-32000] Insufficient funds");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Numeric error code
    pub code: i64,

    /// Human-readable error message
    pub message: String,

    /// Optional additional error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RemoteError {
    /// Invalid JSON was received by the node
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist on the node
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameter(s)
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal node error
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Create an error with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error carrying additional data
    pub fn with_data(code: i64, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// True when the node does not know the requested method
    pub fn is_method_not_found(&self) -> bool {
        self.code == Self::METHOD_NOT_FOUND
    }
}

impl std::fmt::Display for RemoteError {
    /// Formats as "[code] message"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RemoteError {}
