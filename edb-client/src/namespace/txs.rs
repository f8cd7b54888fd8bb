use crate::schema::{CallResult, TxReceipt, UnconfirmedTxs};
use crate::Client;
use edb_core::Result;
use serde_json::json;

/// Transactions and contract calls
#[derive(Debug, Clone)]
pub struct Txs {
    client: Client,
}

impl Txs {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Transactions waiting in the mempool
    pub async fn get_unconfirmed_txs(&self) -> Result<UnconfirmedTxs> {
        self.client.invoke("getUnconfirmedTxs", None).await
    }

    /// Run `code` against `data` without touching chain state
    ///
    /// Both arguments are hex strings.
    pub async fn call_code(&self, code: &str, data: &str) -> Result<CallResult> {
        self.client
            .invoke("callCode", Some(json!({ "code": code, "data": data })))
            .await
    }

    /// Call the contract at `address` without touching chain state
    pub async fn call(&self, address: &str, data: &str) -> Result<CallResult> {
        self.client
            .invoke("call", Some(json!({ "address": address, "data": data })))
            .await
    }

    /// Sign, broadcast and wait for the transaction to be committed
    ///
    /// Resolves only once the node has seen the transaction in a block, which
    /// can take several block intervals. `data` is hex call data for a
    /// contract target, `None` for a plain transfer.
    pub async fn send_and_hold(
        &self,
        priv_key: &str,
        to_address: &str,
        amount: u64,
        data: Option<&str>,
    ) -> Result<TxReceipt> {
        let params = json!({
            "priv_key": priv_key,
            "to_address": to_address,
            "amount": amount,
            "data": data.unwrap_or_default(),
        });
        self.client.invoke("sendAndHold", Some(params)).await
    }
}
