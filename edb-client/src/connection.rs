//! Connection event loop
//!
//! One task per started client. It exclusively owns both transport halves
//! and the [`Dispatcher`], and multiplexes three sources with `select!`:
//!
//! - inbound transport events (frames, close, error)
//! - commands from [`Client`](crate::Client) handles
//! - the earliest request deadline
//!
//! Completions fire on this task in inbound-frame order. When the loop ends,
//! for any reason, it publishes the terminal state, fails every pending
//! request and every call still queued, then exits. No completion is lost.

use crate::dispatcher::{self, Completion, Dispatcher, Settled};
use crate::lifecycle::{ClientState, ConnectionTracker};
use crate::metrics::ClientMetrics;
use crate::notification::{Notification, NotificationHandler};
use crate::transport::{TransportEvent, TransportReceiver, TransportSender};
use edb_core::{codec, Error, Inbound, RemoteResult, TransportError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

/// Close code sent when the client shuts the connection down itself
pub(crate) const NORMAL_CLOSURE: u16 = 1000;
const CLIENT_CLOSE_REASON: &str = "closed by client";

/// Work handed to the event loop by client handles
pub(crate) enum Command {
    /// Register, encode and send one call
    Call {
        method: String,
        params: Option<Value>,
        completion: Completion,
    },
    /// Report the size of the correlation table
    PendingCount(oneshot::Sender<usize>),
    /// Close the connection
    Close,
}

/// Why the loop stopped and which state the client ends in
struct Shutdown {
    error: Error,
    state: ClientState,
}

pub(crate) struct Connection {
    sender: TransportSender,
    receiver: TransportReceiver,
    commands: mpsc::UnboundedReceiver<Command>,
    dispatcher: Dispatcher,
    tracker: Arc<ConnectionTracker>,
    notifications: NotificationHandler,
    metrics: Option<Arc<ClientMetrics>>,
    request_timeout: Option<Duration>,
}

impl Connection {
    pub(crate) fn new(
        sender: TransportSender,
        receiver: TransportReceiver,
        commands: mpsc::UnboundedReceiver<Command>,
        tracker: Arc<ConnectionTracker>,
        notifications: NotificationHandler,
        metrics: Option<Arc<ClientMetrics>>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            sender,
            receiver,
            commands,
            dispatcher: Dispatcher::new(),
            tracker,
            notifications,
            metrics,
            request_timeout,
        }
    }

    /// Drive the connection until it closes or fails
    pub(crate) async fn run(mut self) {
        let shutdown = loop {
            let deadline = self.dispatcher.next_deadline();

            let outcome = tokio::select! {
                event = self.receiver.next_event() => self.handle_event(event).await,
                command = self.commands.recv() => self.handle_command(command).await,
                // The sleep future is built even when the branch is disabled
                _ = sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                    self.expire();
                    None
                }
            };

            if let Some(shutdown) = outcome {
                break shutdown;
            }
        };

        self.shutdown(shutdown);
    }

    async fn handle_event(&mut self, event: Option<TransportEvent>) -> Option<Shutdown> {
        let event = match event {
            Some(TransportEvent::Message(text)) => {
                self.handle_frame(&text).await;
                return None;
            }
            Some(event) => event,
            None => TransportEvent::Closed {
                code: None,
                reason: "stream ended".to_string(),
            },
        };

        let state = match event {
            TransportEvent::Error(_) => ClientState::Failed,
            _ => ClientState::Closed,
        };
        let error = match event.into_error() {
            Some(error) => error,
            None => TransportError::Socket("unexpected transport event".to_string()),
        };

        if state == ClientState::Failed {
            tracing::error!(error = %error, "Connection failed");
        } else {
            tracing::info!(error = %error, "Connection closed by node");
        }
        self.record_error("transport");

        Some(Shutdown {
            error: Error::Transport(error),
            state,
        })
    }

    async fn handle_frame(&mut self, text: &str) {
        let frame = match codec::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable frame");
                self.record_error("decode");
                return;
            }
        };

        match frame {
            Inbound::Response { id, result } => {
                if let RemoteResult::Failure(ref error) = result {
                    tracing::debug!(id = %id, code = error.code, message = %error.message, "Node reported an error");
                }
                match self.dispatcher.resolve(&id, result) {
                    Some(settled) => self.record_settled(&settled),
                    None => self.record_error("unknown_id"),
                }
            }
            Inbound::Notification { method, params } => {
                if let Some(ref m) = self.metrics {
                    m.record_notification(&method);
                }
                self.notifications
                    .dispatch(Notification { method, params })
                    .await;
            }
        }
    }

    async fn handle_command(&mut self, command: Option<Command>) -> Option<Shutdown> {
        match command {
            Some(Command::Call {
                method,
                params,
                completion,
            }) => self.send_call(method, params, completion).await,
            Some(Command::PendingCount(reply)) => {
                let _ = reply.send(self.dispatcher.pending_count());
                None
            }
            // Every client handle is gone, or close was requested
            Some(Command::Close) | None => {
                tracing::info!(pending = self.dispatcher.pending_count(), "Closing connection");
                self.sender.close(NORMAL_CLOSURE, CLIENT_CLOSE_REASON).await;
                Some(Shutdown {
                    error: Error::Transport(TransportError::Closed {
                        code: Some(NORMAL_CLOSURE),
                        reason: CLIENT_CLOSE_REASON.to_string(),
                    }),
                    state: ClientState::Closed,
                })
            }
        }
    }

    async fn send_call(
        &mut self,
        method: String,
        params: Option<Value>,
        completion: Completion,
    ) -> Option<Shutdown> {
        let id = match self
            .dispatcher
            .register(method.as_str(), completion, self.request_timeout)
        {
            Ok(id) => id,
            Err(_) => return None,
        };
        if let Some(ref m) = self.metrics {
            m.record_issued();
        }

        let text = match codec::encode(&method, params, id.clone()) {
            Ok(text) => text,
            Err(e) => {
                if let Some(settled) = self.dispatcher.fail(&id, e) {
                    self.record_settled(&settled);
                }
                return None;
            }
        };

        if let Err(e) = self.sender.send(text).await {
            tracing::error!(method = %method, id = %id, error = %e, "Failed to send request");
            if let Some(settled) = self.dispatcher.fail(&id, Error::Transport(e.clone())) {
                self.record_settled(&settled);
            }
            // A failed write means the socket is unusable for everyone
            return Some(Shutdown {
                error: Error::Transport(e),
                state: ClientState::Failed,
            });
        }

        tracing::debug!(method = %method, id = %id, "Request sent");
        None
    }

    fn expire(&mut self) {
        for settled in self.dispatcher.expire(Instant::now()) {
            tracing::warn!(
                method = %settled.method,
                elapsed_secs = settled.elapsed.as_secs_f64(),
                "Request timed out"
            );
            self.record_settled(&settled);
        }
    }

    fn shutdown(mut self, shutdown: Shutdown) {
        // Publish first so new callers fail fast instead of queueing
        self.tracker.transition(shutdown.state);
        if let Some(ref m) = self.metrics {
            m.update_connection_state(self.tracker.state());
        }

        self.commands.close();

        let settled = self.dispatcher.fail_all(shutdown.error.clone());
        if !settled.is_empty() {
            tracing::warn!(
                failed = settled.len(),
                error = %shutdown.error,
                "Failed pending requests"
            );
        }
        for settled in &settled {
            self.record_settled(settled);
        }

        // Calls that were queued before the queue closed
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Call { completion, .. } = command {
                dispatcher::fire(completion, Err(Error::ClientClosed));
            }
        }

        tracing::info!(
            state = %self.tracker.state(),
            dropped_responses = self.dispatcher.dropped_responses(),
            "Connection task finished"
        );
    }

    fn record_settled(&self, settled: &Settled) {
        if let Some(ref m) = self.metrics {
            m.record_settled(&settled.method, settled.is_ok(), settled.elapsed.as_secs_f64());
            if let Some(kind) = settled.error_kind {
                m.record_error(kind);
            }
        }
    }

    fn record_error(&self, kind: &str) {
        if let Some(ref m) = self.metrics {
            m.record_error(kind);
        }
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365)
}
