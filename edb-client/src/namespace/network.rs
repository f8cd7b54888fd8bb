use crate::schema::{ClientVersion, Listeners, Listening, Moniker, NetworkInfo, Peer};
use crate::Client;
use edb_core::Result;
use serde_json::json;

/// Peer-to-peer network information
#[derive(Debug, Clone)]
pub struct Network {
    client: Client,
}

impl Network {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Version, moniker, listeners and peers in one call
    pub async fn get_info(&self) -> Result<NetworkInfo> {
        self.client.invoke("getNetworkInfo", None).await
    }

    pub async fn get_client_version(&self) -> Result<ClientVersion> {
        self.client.invoke("getClientVersion", None).await
    }

    pub async fn get_moniker(&self) -> Result<Moniker> {
        self.client.invoke("getMoniker", None).await
    }

    pub async fn is_listening(&self) -> Result<Listening> {
        self.client.invoke("isListening", None).await
    }

    /// Addresses the node accepts peer connections on
    pub async fn get_listeners(&self) -> Result<Listeners> {
        self.client.invoke("getListeners", None).await
    }

    pub async fn get_peers(&self) -> Result<Vec<Peer>> {
        self.client.invoke("getPeers", None).await
    }

    /// A single peer by address
    pub async fn get_peer(&self, address: &str) -> Result<Peer> {
        self.client
            .invoke("getPeer", Some(json!({ "address": address })))
            .await
    }
}
