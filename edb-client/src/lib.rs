//! WebSocket client for blockchain nodes
//!
//! This crate talks JSON-RPC 2.0 to a node over one persistent WebSocket and
//! groups the node's remote procedures into namespaces: consensus, network,
//! transactions, accounts and blockchain metadata.
//!
//! # Core Features
//!
//! - **Namespaced methods**: typed async methods per remote procedure
//! - **Concurrent calls**: any number in flight, correlated by id
//! - **Uniform errors**: transport failures reach every pending caller,
//!   node errors reach only the caller they belong to
//! - **Timeouts**: optional per-call deadline
//! - **Notifications**: handlers for frames the node pushes unprompted
//! - **Observability**: `tracing` events and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use edb_client::create_instance;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_instance("ws://localhost:1337/socketrpc", false)?;
//!     client.start().await?;
//!
//!     let height = client.blockchain().get_latest_block_height().await?;
//!     println!("height: {}", height.height);
//!
//!     // Two calls in flight at once
//!     let accounts = client.accounts();
//!     let (a, b) = tokio::join!(accounts.gen_priv_account(), accounts.gen_priv_account());
//!     println!("{} {}", a?.address, b?.address);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Callbacks
//!
//! ```rust,no_run
//! # fn example(client: &edb_client::Client) {
//! client.call_with("erisdb.isListening", None, |result| match result {
//!     Ok(value) => println!("listening: {}", value["listening"]),
//!     Err(e) => eprintln!("call failed: {}", e),
//! });
//! # }
//! ```

mod client;
mod client_builder;
mod connection;
mod dispatcher;
mod endpoint;
mod lifecycle;
mod metrics;
pub mod namespace;
mod notification;
pub mod schema;
mod transport;

pub use client::{create_instance, Client};
pub use client_builder::{ClientBuilder, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_METHOD_PREFIX};
pub use dispatcher::{Completion, Dispatcher, PendingRequest, Settled};
pub use endpoint::Endpoint;
pub use lifecycle::{ClientState, ConnectionTracker};
pub use metrics::ClientMetrics;
pub use namespace::{Accounts, Blockchain, Consensus, Network, Txs};
pub use notification::{Notification, NotificationHandler};
pub use transport::{TransportEvent, TransportReceiver, TransportSender};
