use crate::schema::{BlockchainInfo, ChainId, GenesisHash, LatestBlockHeight};
use crate::Client;
use edb_core::Result;
use serde_json::{json, Value};

/// Chain metadata and blocks
#[derive(Debug, Clone)]
pub struct Blockchain {
    client: Client,
}

impl Blockchain {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Chain id, genesis hash and the latest block
    pub async fn get_info(&self) -> Result<BlockchainInfo> {
        self.client.invoke("getBlockchainInfo", None).await
    }

    pub async fn get_chain_id(&self) -> Result<ChainId> {
        self.client.invoke("getChainId", None).await
    }

    pub async fn get_genesis_hash(&self) -> Result<GenesisHash> {
        self.client.invoke("getGenesisHash", None).await
    }

    pub async fn get_latest_block_height(&self) -> Result<LatestBlockHeight> {
        self.client.invoke("getLatestBlockHeight", None).await
    }

    /// The latest block, undecoded
    pub async fn get_latest_block(&self) -> Result<Value> {
        self.client.invoke("getLatestBlock", None).await
    }

    /// The block at `height`, undecoded
    pub async fn get_block(&self, height: u64) -> Result<Value> {
        self.client
            .invoke("getBlock", Some(json!({ "height": height })))
            .await
    }
}
