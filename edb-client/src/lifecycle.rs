//! Client lifecycle state
//!
//! # States
//!
//! - **Idle**: constructed, `start` not called yet
//! - **Connecting**: handshake in progress
//! - **Open**: namespace methods may be called
//! - **Closing**: `close` was called, teardown in progress
//! - **Closed**: closed by this client or by the node
//! - **Failed**: the connection could not be established, or errored
//!
//! # State Transitions
//!
//! ```text
//! Idle → Connecting → Open → Closing → Closed
//!             ↓         ↓        ↓
//!           Failed    Failed   Failed
//! ```
//!
//! Idle, Connecting and Open may also move straight to Closed.
//!
//! Closed and Failed are terminal: a client is never reused after either.
//! The state is published through a `watch` channel so any task can read it
//! without awaiting, and tests can wait for a particular state.

use std::fmt;
use tokio::sync::watch;

/// Lifecycle state of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Constructed, not started
    Idle,
    /// Opening the connection
    Connecting,
    /// Connected and usable
    Open,
    /// Closing at the caller's request
    Closing,
    /// Closed, not reusable
    Closed,
    /// Failed, not reusable
    Failed,
}

impl ClientState {
    /// True for Closed and Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, ClientState::Closed | ClientState::Failed)
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(self, next: ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Idle, Closed)
                | (Connecting, Open)
                | (Connecting, Failed)
                | (Connecting, Closed)
                | (Open, Closing)
                | (Open, Closed)
                | (Open, Failed)
                | (Closing, Closed)
                | (Closing, Failed)
        )
    }

    /// Value reported on the connection state gauge
    pub fn as_metric(self) -> i64 {
        match self {
            ClientState::Idle => 0,
            ClientState::Connecting => 1,
            ClientState::Open => 2,
            ClientState::Closing => 3,
            ClientState::Closed => 4,
            ClientState::Failed => 5,
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Idle => "idle",
            ClientState::Connecting => "connecting",
            ClientState::Open => "open",
            ClientState::Closing => "closing",
            ClientState::Closed => "closed",
            ClientState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Single source of truth for a client's state
pub struct ConnectionTracker {
    tx: watch::Sender<ClientState>,
}

impl ConnectionTracker {
    /// Create a tracker in the Idle state
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ClientState::Idle);
        Self { tx }
    }

    /// Current state
    pub fn state(&self) -> ClientState {
        *self.tx.borrow()
    }

    /// Move to `next` if the transition is allowed; returns whether it happened
    pub fn transition(&self, next: ClientState) -> bool {
        let mut from = None;
        let changed = self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                from = Some(*state);
                *state = next;
                true
            } else {
                false
            }
        });

        match from {
            Some(from) => tracing::debug!(%from, to = %next, "Client state changed"),
            None => tracing::trace!(current = %self.state(), to = %next, "State transition refused"),
        }
        changed
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.tx.subscribe()
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
