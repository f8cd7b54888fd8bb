//! Client for a blockchain node over WebSocket
//!
//! This module provides the main [`Client`] type. A client is created idle,
//! opened once with [`start`](Client::start), used through the namespace
//! accessors, and torn down with [`close`](Client::close) or by the node.
//!
//! # Client Lifecycle
//!
//! 1. **Build**: `create_instance` or `ClientBuilder`, no I/O yet
//! 2. **Start**: open the WebSocket and spawn the connection task
//! 3. **Use**: namespace methods, raw `call`/`call_with`
//! 4. **Close**: pending calls fail, the client cannot be restarted
//!
//! Calling a method while the client is not open fails immediately with
//! `Error::NotConnected`; nothing is queued.
//!
//! # Cloning
//!
//! `Client` is cheaply cloneable using `Arc` internally. All clones share the
//! same connection and state, and the namespace facades hold a clone. The
//! connection closes when `close` is called or the last clone is dropped.

use crate::client_builder::{ClientBuilder, ClientConfig};
use crate::connection::{Command, Connection, NORMAL_CLOSURE};
use crate::lifecycle::{ClientState, ConnectionTracker};
use crate::metrics::ClientMetrics;
use crate::namespace::{Accounts, Blockchain, Consensus, Network, Txs};
use crate::notification::{Notification, NotificationHandler};
use crate::transport;
use edb_core::{codec, Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

/// Create an idle client for `url`
///
/// Shorthand for `ClientBuilder::new(url).secure(secure).build()`.
///
/// ```rust,no_run
/// # async fn example() -> edb_core::Result<()> {
/// let client = edb_client::create_instance("ws://localhost:1337/socketrpc", true)?;
/// client.start().await?;
///
/// let listening = client.network().is_listening().await?;
/// assert!(listening.listening);
/// # Ok(())
/// # }
/// ```
pub fn create_instance(url: impl Into<String>, secure: bool) -> Result<Client> {
    ClientBuilder::new(url).secure(secure).build()
}

/// Node client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    tracker: Arc<ConnectionTracker>,
    /// Set once by `start`, before the state becomes Open
    commands: OnceLock<mpsc::UnboundedSender<Command>>,
    task: Mutex<Option<JoinHandle<()>>>,
    notifications: NotificationHandler,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Client {
    pub(crate) fn new(config: ClientConfig, metrics: Option<Arc<ClientMetrics>>) -> Self {
        let client = Self {
            inner: Arc::new(ClientInner {
                config,
                tracker: Arc::new(ConnectionTracker::new()),
                commands: OnceLock::new(),
                task: Mutex::new(None),
                notifications: NotificationHandler::new(),
                metrics,
            }),
        };
        client.record_state();
        client
    }

    /// Open the connection
    ///
    /// Fails with a transport error if the node cannot be reached, leaving the
    /// client Failed. Calling `start` twice is `Error::AlreadyStarted`;
    /// starting a closed or failed client is `Error::ClientClosed`.
    #[tracing::instrument(skip(self), fields(url = %self.inner.config.endpoint))]
    pub async fn start(&self) -> Result<()> {
        let tracker = &self.inner.tracker;
        if !tracker.transition(ClientState::Connecting) {
            return Err(if tracker.state().is_terminal() {
                Error::ClientClosed
            } else {
                Error::AlreadyStarted
            });
        }
        self.record_state();
        tracing::info!("Connecting to node");

        let config = &self.inner.config;
        let (mut sender, receiver) =
            match transport::open(&config.endpoint, config.connect_timeout).await {
                Ok(halves) => halves,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect");
                    tracker.transition(ClientState::Failed);
                    self.record_state();
                    self.record_error("transport");
                    return Err(Error::Transport(e));
                }
            };

        let (tx, rx) = mpsc::unbounded_channel();
        if self.inner.commands.set(tx).is_err() {
            return Err(Error::AlreadyStarted);
        }

        if !tracker.transition(ClientState::Open) {
            // close() won the race while the handshake was in flight
            sender.close(NORMAL_CLOSURE, "closed by client").await;
            return Err(Error::ClientClosed);
        }
        self.record_state();

        let connection = Connection::new(
            sender,
            receiver,
            rx,
            Arc::clone(tracker),
            self.inner.notifications.clone(),
            self.inner.metrics.clone(),
            config.request_timeout,
        );
        *self.inner.task.lock().await = Some(tokio::spawn(connection.run()));

        tracing::info!("Connected");
        Ok(())
    }

    /// Callback form of [`start`](Self::start)
    ///
    /// `callback` fires exactly once, from a spawned task.
    pub fn start_with<F>(&self, callback: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { callback(client.start().await) });
    }

    /// Issue a call whose completion fires exactly once
    ///
    /// `method` is sent verbatim, without the configured prefix. The
    /// completion runs on the connection task, or synchronously on this
    /// thread when the client is not open; it must not block. A panic inside
    /// it on the connection task is logged and does not affect other calls.
    pub fn call_with<F>(&self, method: impl Into<String>, params: Option<Value>, completion: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        let method = method.into();

        let state = self.inner.tracker.state();
        let commands = match self.inner.commands.get() {
            Some(commands) if state == ClientState::Open => commands,
            _ => {
                tracing::debug!(method = %method, state = %state, "Rejecting call on a client that is not open");
                self.record_error("not_connected");
                completion(Err(Error::NotConnected));
                return;
            }
        };

        let command = Command::Call {
            method,
            params,
            completion: Box::new(completion),
        };
        // The connection task already stopped: nothing will ever answer
        if let Err(mpsc::error::SendError(Command::Call { completion, .. })) = commands.send(command)
        {
            completion(Err(Error::ClientClosed));
        }
    }

    /// Issue a call and await its raw result
    ///
    /// ```rust,no_run
    /// # async fn example(client: &edb_client::Client) -> edb_core::Result<()> {
    /// let chain = client.call("erisdb.getChainId", None).await?;
    /// println!("{}", chain["chain_id"]);
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip(self, params), fields(method = %method.as_ref()))]
    pub async fn call(&self, method: impl Into<String> + AsRef<str>, params: Option<Value>) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        self.call_with(method, params, move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap_or(Err(Error::ClientClosed))
    }

    /// Issue a call and decode the result into `T`
    pub async fn call_typed<T>(&self, method: impl Into<String> + AsRef<str>, params: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        codec::decode_result(self.call(method, params).await?)
    }

    /// Call a namespace method: prefix the name and decode the result
    pub(crate) async fn invoke<T>(&self, method: &str, params: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.call_typed(self.inner.config.method_name(method), params).await
    }

    /// Close the connection and wait for teardown
    ///
    /// Every pending call fails with a transport error carrying close code
    /// 1000. Closing an idle client just marks it closed. Idempotent.
    pub async fn close(&self) {
        let tracker = &self.inner.tracker;
        match tracker.state() {
            ClientState::Idle | ClientState::Connecting => {
                tracker.transition(ClientState::Closed);
                self.record_state();
                return;
            }
            ClientState::Open => {
                if tracker.transition(ClientState::Closing) {
                    self.record_state();
                }
                if let Some(commands) = self.inner.commands.get() {
                    let _ = commands.send(Command::Close);
                }
            }
            ClientState::Closing | ClientState::Closed | ClientState::Failed => {}
        }

        let task = self.inner.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                // Nobody else will publish a terminal state
                tracing::error!(error = %e, "Connection task panicked");
                tracker.transition(ClientState::Failed);
                self.record_state();
            }
        }

        // Another caller may own the join handle
        let mut state = tracker.subscribe();
        let _ = state.wait_for(|s| s.is_terminal()).await;
    }

    /// Current lifecycle state
    pub fn state(&self) -> ClientState {
        self.inner.tracker.state()
    }

    /// Watch lifecycle changes
    pub fn state_changes(&self) -> watch::Receiver<ClientState> {
        self.inner.tracker.subscribe()
    }

    /// True while calls may be issued
    pub fn is_open(&self) -> bool {
        self.state() == ClientState::Open
    }

    /// Number of calls awaiting a response
    pub async fn pending_count(&self) -> usize {
        let Some(commands) = self.inner.commands.get() else {
            return 0;
        };
        let (tx, rx) = oneshot::channel();
        if commands.send(Command::PendingCount(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Register a handler for unsolicited frames named `method`
    pub async fn on_notification<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.notifications.register(method, handler).await;
    }

    /// Resolved configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Consensus state and validators
    pub fn consensus(&self) -> Consensus {
        Consensus::new(self.clone())
    }

    /// Peer and listener information
    pub fn network(&self) -> Network {
        Network::new(self.clone())
    }

    /// Transactions and contract calls
    pub fn txs(&self) -> Txs {
        Txs::new(self.clone())
    }

    /// Accounts and storage
    pub fn accounts(&self) -> Accounts {
        Accounts::new(self.clone())
    }

    /// Chain metadata and blocks
    pub fn blockchain(&self) -> Blockchain {
        Blockchain::new(self.clone())
    }

    fn record_state(&self) {
        if let Some(ref m) = self.inner.metrics {
            m.update_connection_state(self.state());
        }
    }

    fn record_error(&self, kind: &str) {
        if let Some(ref m) = self.inner.metrics {
            m.record_error(kind);
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.config.endpoint.url())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn idle_client() -> Client {
        create_instance("ws://127.0.0.1:1/socketrpc", false).unwrap()
    }

    #[tokio::test]
    async fn test_call_before_start_fails_fast() {
        let client = idle_client();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        client.call_with("erisdb.isListening", None, move |result| {
            assert!(matches!(result, Err(Error::NotConnected)));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Fired synchronously, exactly once
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(client.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_namespace_call_before_start() {
        let client = idle_client();
        let result = client.network().is_listening().await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_idle_client_is_terminal() {
        let client = idle_client();
        client.close().await;

        assert_eq!(client.state(), ClientState::Closed);
        assert!(matches!(client.start().await, Err(Error::ClientClosed)));
        assert!(matches!(client.call("erisdb.getMoniker", None).await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = idle_client();
        let clone = client.clone();
        clone.close().await;
        assert_eq!(client.state(), ClientState::Closed);
        assert!(format!("{:?}", client).contains("Closed"));
    }
}
