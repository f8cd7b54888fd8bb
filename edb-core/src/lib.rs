//! Protocol types and codec for the edb client
//!
//! This crate holds everything about talking to a blockchain node that does
//! not need a runtime or a socket:
//!
//! - **Types**: outgoing calls, correlation ids, inbound frames
//! - **Codec**: envelope encoding, frame decoding, typed result decoding
//! - **Errors**: the single error taxonomy every client operation reports
//! - **Observability**: `tracing` subscriber and OpenTelemetry setup
//!
//! The `edb-client` crate builds the WebSocket transport and the typed
//! namespace facades on top of these.
//!
//! # Example
//!
//! ```rust
//! use edb_core::{codec, Id, Inbound, RemoteResult};
//! use serde_json::json;
//!
//! let text = codec::encode("erisdb.getAccount", Some(json!({"address": "AB12"})), Id::Number(1)).unwrap();
//! assert!(text.contains("getAccount"));
//!
//! let frame = codec::decode(r#"{"jsonrpc":"2.0","id":1,"result":{"address":"AB12"}}"#).unwrap();
//! match frame {
//!     Inbound::Response { result: RemoteResult::Success(value), .. } => {
//!         assert_eq!(value["address"], "AB12");
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{DecodeError, Error, RemoteError, Result, TransportError};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, Inbound, RemoteCall, RemoteResult, JSONRPC_VERSION};
