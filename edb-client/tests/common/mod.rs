//! Common test utilities for edb-client integration tests
//!
//! `MockNode` is an in-process WebSocket server standing in for a blockchain
//! node. By default it answers every call from recorded fixtures, echoing the
//! request id. Tests that need reordering, withheld responses, malformed
//! frames or dropped connections script a `Session` directly.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

pub const ADDRESS: &str = "37236DF251AB70022B1DA351F08A20FB52443E37";
pub const STORAGE_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";
pub const GENESIS_HASH: &str = "DA4F4DC4A54620F1E0AA1213631C4DC2957B7415E3F8C066C30009BC57C4E5FC";

/// Mock node for client testing
pub struct MockNode {
    addr: SocketAddr,
    accept_task: JoinHandle<()>,
    messages: mpsc::UnboundedReceiver<String>,
}

impl MockNode {
    /// Start a node that answers every call from the fixtures
    pub async fn start() -> Self {
        Self::with_session(serve_fixtures).await
    }

    /// Start a node that runs `script` for every accepted connection
    pub async fn with_session<F, Fut>(script: F) -> Self
    where
        F: Fn(Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, messages) = mpsc::unbounded_channel();
        let script = Arc::new(script);

        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = seen_tx.clone();
                let script = Arc::clone(&script);
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(stream).await {
                        script(Session { ws, seen }).await;
                    }
                });
            }
        });

        Self {
            addr,
            accept_task,
            messages,
        }
    }

    /// URL with the node's usual path
    pub fn url(&self) -> String {
        format!("ws://{}/socketrpc", self.addr)
    }

    /// Next raw frame the node received, parsed
    pub async fn wait_for_message(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), self.messages.recv())
            .await
            .ok()
            .flatten()
            .and_then(|text| serde_json::from_str(&text).ok())
    }

    /// Stop accepting connections
    pub fn shutdown(self) {
        self.accept_task.abort();
    }
}

/// One accepted connection, driven by a test script
pub struct Session {
    ws: WebSocketStream<TcpStream>,
    seen: mpsc::UnboundedSender<String>,
}

impl Session {
    /// Next request from the client; `None` once it hung up
    pub async fn next_request(&mut self) -> Option<Value> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => {
                    let _ = self.seen.send(text.clone());
                    return serde_json::from_str(&text).ok();
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Read `n` requests
    pub async fn collect_requests(&mut self, n: usize) -> Vec<Value> {
        let mut requests = Vec::with_capacity(n);
        while requests.len() < n {
            match self.next_request().await {
                Some(request) => requests.push(request),
                None => break,
            }
        }
        requests
    }

    pub async fn send_text(&mut self, text: impl Into<String>) {
        let _ = self.ws.send(Message::Text(text.into())).await;
    }

    pub async fn reply(&mut self, request: &Value, result: Value) {
        self.send_text(success_frame(&request["id"], result)).await;
    }

    pub async fn reply_error(&mut self, request: &Value, code: i64, message: &str) {
        self.send_text(error_frame(&request["id"], code, message)).await;
    }

    /// Answer `request` from the fixtures, or with method-not-found
    pub async fn reply_from_fixtures(&mut self, request: &Value) {
        let method = method_of(request);
        match fixture(&method, request) {
            Some(result) => self.reply(request, result).await,
            None => {
                self.reply_error(request, -32601, &format!("Method not found: {}", method))
                    .await
            }
        }
    }

    /// Keep reading until the client hangs up, answering nothing
    pub async fn swallow(mut self) {
        while self.next_request().await.is_some() {}
    }

    /// Close with a close frame
    pub async fn close(mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        let _ = self.ws.close(Some(frame)).await;
        while let Some(Ok(_)) = self.ws.next().await {}
    }

    /// Drop the TCP connection without a close handshake
    pub fn drop_connection(self) {
        drop(self);
    }
}

/// Default script: answer everything from the fixtures
pub async fn serve_fixtures(mut session: Session) {
    while let Some(request) = session.next_request().await {
        session.reply_from_fixtures(&request).await;
    }
}

/// Remote method without the `erisdb.` prefix
pub fn method_of(request: &Value) -> String {
    let method = request["method"].as_str().unwrap_or_default();
    method.strip_prefix("erisdb.").unwrap_or(method).to_string()
}

pub fn success_frame(id: &Value, result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
}

pub fn error_frame(id: &Value, code: i64, message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}).to_string()
}

pub fn notification_frame(method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "method": method, "params": params}).to_string()
}

/// Recorded result for `method`
///
/// `genPrivAccount` derives the address from the request id so concurrent
/// calls can be told apart.
pub fn fixture(method: &str, request: &Value) -> Option<Value> {
    let result = match method {
        "getConsensusState" => json!({
            "height": 1,
            "round": 0,
            "step": 1,
            "start_time": "2016-03-21T14:01:52.047Z",
            "commit_time": "0001-01-01T00:00:00Z",
            "validators": [{
                "address": ADDRESS,
                "pub_key": [1, "CB3688B7561D488A2A4834E1AEE9398BEF94844D8BDBBCA980C11E3654A45906"],
                "bond_height": 0,
                "unbond_height": 0,
                "last_commit_height": 0,
                "voting_power": 5000000000u64,
                "accum": 0
            }],
            "proposal": null
        }),
        "getValidators" => json!({
            "block_height": 1,
            "bonded_validators": [{"address": ADDRESS, "voting_power": 5000000000u64}],
            "unbonding_validators": []
        }),
        "getNetworkInfo" => json!({
            "client_version": "0.5.0",
            "moniker": "anothertester",
            "listening": true,
            "listeners": ["Listener(@10.0.0.4:46656)"],
            "peers": []
        }),
        "getClientVersion" => json!({"client_version": "0.5.0"}),
        "getMoniker" => json!({"moniker": "anothertester"}),
        "isListening" => json!({"listening": true}),
        "getListeners" => json!({"listeners": ["Listener(@10.0.0.4:46656)"]}),
        "getPeers" => json!([]),
        "getPeer" => json!({
            "node_info": {"moniker": "peer", "network": "blockchain"},
            "is_outbound": true
        }),
        "getUnconfirmedTxs" => json!({"txs": []}),
        "callCode" | "call" => json!({
            "return": "0000000000000000000000000000000000000000000000000000000000000005",
            "gas_used": 0
        }),
        "sendAndHold" => json!({
            "call_data": {
                "caller": ADDRESS,
                "callee": request["params"]["to_address"],
                "data": "",
                "value": request["params"]["amount"],
                "gas": 1000
            },
            "origin": ADDRESS,
            "tx_id": "F5C0F4F7AF46F3D6C6F01B70E8C5E2B1A7D95E0B",
            "return": "",
            "exception": ""
        }),
        "genPrivAccount" => {
            let id = request["id"].as_u64().unwrap_or_default();
            json!({
                "address": format!("{:040X}", id),
                "pub_key": [1, format!("{:064X}", id + 1000)],
                "priv_key": [1, format!("{:0128X}", id + 2000)]
            })
        }
        "getAccounts" => json!({
            "accounts": [
                {"address": "0000000000000000000000000000000000000000", "pub_key": null,
                 "sequence": 0, "balance": 1337, "code": "", "storage_root": ""},
                {"address": ADDRESS, "pub_key": null,
                 "sequence": 0, "balance": 200000000, "code": "", "storage_root": ""}
            ]
        }),
        "getAccount" => json!({
            "address": request["params"]["address"],
            "pub_key": null,
            "sequence": 0,
            "balance": 200000000,
            "code": "",
            "storage_root": ""
        }),
        "getStorage" => json!({
            "storage_root": "",
            "storage_items": [{
                "key": STORAGE_KEY,
                "value": "0000000000000000000000000000000000000000000000000000000000000005"
            }]
        }),
        "getStorageAt" => json!({
            "key": request["params"]["key"],
            "value": "0000000000000000000000000000000000000000000000000000000000000005"
        }),
        "getBlockchainInfo" => json!({
            "chain_id": "blockchain",
            "genesis_hash": GENESIS_HASH,
            "latest_block_height": 0,
            "latest_block": null
        }),
        "getChainId" => json!({"chain_id": "blockchain"}),
        "getGenesisHash" => json!({"hash": GENESIS_HASH}),
        "getLatestBlockHeight" => json!({"height": 0}),
        "getLatestBlock" => json!({"header": {"chain_id": "blockchain", "height": 0}}),
        "getBlock" => json!({
            "header": {"chain_id": "blockchain", "height": request["params"]["height"]}
        }),
        _ => return None,
    };
    Some(result)
}
