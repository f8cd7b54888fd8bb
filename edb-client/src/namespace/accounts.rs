use crate::schema::{Account, AccountList, PrivAccount, Storage, StorageItem};
use crate::Client;
use edb_core::Result;
use serde_json::json;

/// Accounts and contract storage
#[derive(Debug, Clone)]
pub struct Accounts {
    client: Client,
}

impl Accounts {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Generate a fresh key pair and its address on the node
    pub async fn gen_priv_account(&self) -> Result<PrivAccount> {
        self.client.invoke("genPrivAccount", None).await
    }

    pub async fn get_accounts(&self) -> Result<AccountList> {
        self.client.invoke("getAccounts", None).await
    }

    pub async fn get_account(&self, address: &str) -> Result<Account> {
        self.client
            .invoke("getAccount", Some(json!({ "address": address })))
            .await
    }

    /// Every storage slot of the account at `address`
    pub async fn get_storage(&self, address: &str) -> Result<Storage> {
        self.client
            .invoke("getStorage", Some(json!({ "address": address })))
            .await
    }

    /// One storage slot; `key` is a hex string
    pub async fn get_storage_at(&self, address: &str, key: &str) -> Result<StorageItem> {
        self.client
            .invoke("getStorageAt", Some(json!({ "address": address, "key": key })))
            .await
    }
}
