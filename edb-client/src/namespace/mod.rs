//! Namespace facades
//!
//! Each accessor on [`Client`](crate::Client) returns a small value bound to
//! a clone of the client. A facade method maps its arguments to a named
//! params object, calls `<prefix>.<remoteMethod>` and decodes the result into
//! the method's record from [`schema`](crate::schema). Facades hold no other
//! state, so any number may exist per client and they are interchangeable.
//!
//! Business rules are the node's concern; arguments are passed through as
//! given.

mod accounts;
mod blockchain;
mod consensus;
mod network;
mod txs;

pub use accounts::Accounts;
pub use blockchain::Blockchain;
pub use consensus::Consensus;
pub use network::Network;
pub use txs::Txs;
