//! edb - WebSocket JSON-RPC client for blockchain nodes
//!
//! This is the main convenience crate that re-exports the edb sub-crates.
//! Use it if you want a single dependency.
//!
//! # Architecture
//!
//! - **edb-core**: wire types, codec, error taxonomy, observability
//! - **edb-client**: connection, request correlation, namespaced methods
//!
//! # Quick Start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = edb::create_instance("localhost:1337/socketrpc", false)?;
//!     client.start().await?;
//!
//!     let info = client.network().get_info().await?;
//!     println!("{} listening: {}", info.moniker, info.listening);
//!
//!     let account = client.accounts().gen_priv_account().await?;
//!     println!("generated {}", account.address);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub use edb_client as client;
pub use edb_core as core;

pub use edb_client::{create_instance, Client, ClientBuilder, ClientState};
pub use edb_core::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_instance_resolves_scheme() {
        let client = create_instance("localhost:1337/socketrpc", false).unwrap();
        assert_eq!(client.config().endpoint.url(), "ws://localhost:1337/socketrpc");
        assert_eq!(client.state(), ClientState::Idle);

        let secure = create_instance("localhost:1337/socketrpc", true).unwrap();
        assert_eq!(secure.config().endpoint.url(), "wss://localhost:1337/socketrpc");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            create_instance("ftp://localhost", false),
            Err(Error::InvalidEndpoint(_))
        ));
    }
}
