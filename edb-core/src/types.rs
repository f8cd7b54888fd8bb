//! Wire types exchanged with the node
//!
//! The node speaks JSON-RPC 2.0 over a single WebSocket. A call goes out as a
//! [`RemoteCall`]; what comes back is decoded into an [`Inbound`] frame, which
//! is either a response tagged with the originating [`Id`] or an unsolicited
//! notification.
//!
//! # Request IDs
//!
//! IDs are opaque correlation tokens. This client always issues numeric IDs,
//! but accepts string IDs on inbound frames so that a node echoing IDs in a
//! different form still correlates (or is dropped as unknown).

use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-RPC protocol version written on every outgoing call
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id pairing one outgoing call with its response
///
/// Implements `Hash` and `Eq` so it can key the correlation table.
///
/// ```rust
/// use edb_core::Id;
///
/// let id: Id = 7u64.into();
/// assert_eq!(id.to_string(), "7");
/// assert_eq!(Id::from("abc").to_string(), "\"abc\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier, used for every id this client allocates
    Number(u64),
    /// String identifier
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

/// An outgoing call: remote method, parameters, correlation id
///
/// Built fresh for every call and never mutated after it is encoded.
///
/// ```rust
/// use edb_core::{Id, RemoteCall};
/// use serde_json::json;
///
/// let call = RemoteCall::new("erisdb.getAccount", Some(json!({"address": "AB"})), Id::Number(1));
/// assert_eq!(call.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCall {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Fully-qualified remote method name
    pub method: String,
    /// Parameters, omitted from the frame when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Correlation id
    pub id: Id,
}

impl RemoteCall {
    /// Create a call with the protocol version filled in
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// Outcome the node reported for one request
///
/// Produced once by the codec and consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult {
    /// The call succeeded; the payload is passed through untouched
    Success(serde_json::Value),
    /// The node reported an error object for this call
    Failure(RemoteError),
}

impl RemoteResult {
    /// Check if the node reported success
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResult::Success(_))
    }

    /// Convert into the value a caller's completion receives
    pub fn into_result(self) -> crate::Result<serde_json::Value> {
        match self {
            RemoteResult::Success(value) => Ok(value),
            RemoteResult::Failure(error) => Err(crate::Error::Remote(error)),
        }
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Response to an earlier call
    Response {
        /// Id echoed by the node
        id: Id,
        /// Success payload or node-reported failure
        result: RemoteResult,
    },
    /// Unsolicited message pushed by the node (no id)
    Notification {
        /// Event or method name
        method: String,
        /// Event payload, if any
        params: Option<serde_json::Value>,
    },
}
