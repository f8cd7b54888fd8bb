//! Result records returned by the namespace methods
//!
//! Each namespace method decodes its success payload into one of these
//! records through `codec::decode_result`; a payload of the wrong shape is
//! `DecodeError::Schema`. Nested records whose contents the client does not
//! interpret (block headers, validator entries, peer node info) stay
//! `serde_json::Value`.
//!
//! Keys a node commonly leaves out are `#[serde(default)]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key tagged with its algorithm, encoded as `[type, "HEX"]`
///
/// ```rust
/// use edb_client::schema::TypedKey;
///
/// let key: TypedKey = serde_json::from_str(r#"[1, "CB3688B7"]"#).unwrap();
/// assert_eq!(key.key_type, 1);
/// assert_eq!(key.hex, "CB3688B7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, String)", into = "(u8, String)")]
pub struct TypedKey {
    /// Algorithm tag, 1 for ed25519
    pub key_type: u8,
    /// Hex encoded key bytes
    pub hex: String,
}

impl From<(u8, String)> for TypedKey {
    fn from((key_type, hex): (u8, String)) -> Self {
        Self { key_type, hex }
    }
}

impl From<TypedKey> for (u8, String) {
    fn from(key: TypedKey) -> Self {
        (key.key_type, key.hex)
    }
}

// consensus

/// Result of `consensus().get_state()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusState {
    pub height: u64,
    pub round: u64,
    pub step: u64,
    pub start_time: String,
    pub commit_time: String,
    pub validators: Vec<Value>,
    /// Current proposal; null between rounds
    pub proposal: Option<Value>,
}

/// Result of `consensus().get_validators()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSet {
    pub block_height: u64,
    pub bonded_validators: Vec<Value>,
    pub unbonding_validators: Vec<Value>,
}

// network

/// A connected peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(default)]
    pub node_info: Value,
    #[serde(default)]
    pub is_outbound: bool,
}

/// Result of `network().get_info()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub client_version: String,
    pub moniker: String,
    pub listening: bool,
    pub listeners: Vec<String>,
    pub peers: Vec<Peer>,
}

/// Result of `network().get_client_version()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientVersion {
    pub client_version: String,
}

/// Result of `network().get_moniker()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moniker {
    pub moniker: String,
}

/// Result of `network().is_listening()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listening {
    pub listening: bool,
}

/// Result of `network().get_listeners()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listeners {
    pub listeners: Vec<String>,
}

// txs

/// Result of `txs().get_unconfirmed_txs()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnconfirmedTxs {
    pub txs: Vec<Value>,
}

/// Result of `txs().call_code()` and `txs().call()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Hex encoded return data
    #[serde(rename = "return")]
    pub return_data: String,
    pub gas_used: u64,
}

/// Result of `txs().send_and_hold()`: the committed call event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    #[serde(default)]
    pub call_data: Value,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub tx_id: String,
    #[serde(default, rename = "return")]
    pub return_data: String,
    /// Empty unless execution threw
    #[serde(default)]
    pub exception: String,
}

// accounts

/// Result of `accounts().gen_priv_account()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivAccount {
    pub address: String,
    pub pub_key: TypedKey,
    pub priv_key: TypedKey,
}

/// An account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    /// Null until the account has signed a transaction
    #[serde(default)]
    pub pub_key: Option<Value>,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub storage_root: String,
}

/// Result of `accounts().get_accounts()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountList {
    pub accounts: Vec<Account>,
}

/// One storage slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItem {
    pub key: String,
    pub value: String,
}

/// Result of `accounts().get_storage()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub storage_root: String,
    pub storage_items: Vec<StorageItem>,
}

// blockchain

/// Result of `blockchain().get_info()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub chain_id: String,
    #[serde(default)]
    pub genesis_hash: String,
    #[serde(default)]
    pub latest_block_height: u64,
    #[serde(default)]
    pub latest_block: Option<Value>,
}

/// Result of `blockchain().get_chain_id()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainId {
    pub chain_id: String,
}

/// Result of `blockchain().get_genesis_hash()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisHash {
    pub hash: String,
}

/// Result of `blockchain().get_latest_block_height()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestBlockHeight {
    pub height: u64,
}
