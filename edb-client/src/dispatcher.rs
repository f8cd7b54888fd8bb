//! Correlation table for in-flight requests
//!
//! Every outgoing call is registered here under a fresh id together with the
//! caller's completion. An inbound response removes the entry with the same
//! id and fires the completion; a connection loss fails every entry at once.
//!
//! # Request Lifecycle
//!
//! 1. **Register**: allocate an id, store the pending request
//! 2. **Send**: the caller encodes and writes the call with that id
//! 3. **Resolve**: a response with the id arrives, the completion fires
//! 4. **Or fail**: timeout, send failure, or fail-all on connection loss
//!
//! Each entry leaves the table exactly once, so each completion fires
//! exactly once. The table is owned by the connection event loop and is
//! never shared, hence the plain `HashMap`.

use edb_core::{Error, Id, RemoteResult, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tokio::time::Instant;

/// Single-fire completion handler for one request
pub type Completion = Box<dyn FnOnce(Result<Value>) + Send + 'static>;

/// Run `completion`, logging a panic instead of unwinding into the caller
///
/// Completions are user code running on the connection task; a panic there
/// must not take the task down with every other pending request.
pub(crate) fn fire(completion: Completion, result: Result<Value>) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || completion(result))) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!(panic = %message, "Completion panicked");
    }
}

/// Client-side record of an in-flight call
pub struct PendingRequest {
    /// Fully-qualified remote method
    pub method: String,
    /// When the request was registered
    pub issued_at: Instant,
    /// When the request times out, if a timeout is configured
    pub deadline: Option<Instant>,
    completion: Completion,
}

impl PendingRequest {
    fn complete(self, result: Result<Value>) -> Settled {
        let settled = Settled {
            method: self.method,
            elapsed: self.issued_at.elapsed(),
            error_kind: result.as_ref().err().map(Error::kind),
        };
        fire(self.completion, result);
        settled
    }
}

/// What the event loop needs to know about a request that left the table
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    /// Fully-qualified remote method
    pub method: String,
    /// Time between registration and settlement
    pub elapsed: Duration,
    /// `Error::kind` of the failure the completion received, if any
    pub error_kind: Option<&'static str>,
}

impl Settled {
    /// True when the completion received a value
    pub fn is_ok(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// Correlation table keyed by request id
pub struct Dispatcher {
    pending: HashMap<Id, PendingRequest>,
    next_id: u64,
    closed: bool,
    dropped_responses: u64,
}

impl Dispatcher {
    /// Create an empty, open dispatcher
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 1,
            closed: false,
            dropped_responses: 0,
        }
    }

    /// Register a request and return its id
    ///
    /// After [`fail_all`](Self::fail_all) this fires `completion` with
    /// `Error::ClientClosed` and returns the same error; the caller must not
    /// send anything.
    pub fn register(
        &mut self,
        method: impl Into<String>,
        completion: Completion,
        timeout: Option<Duration>,
    ) -> Result<Id> {
        if self.closed {
            fire(completion, Err(Error::ClientClosed));
            return Err(Error::ClientClosed);
        }

        let id = Id::Number(self.next_id);
        self.next_id += 1;

        let issued_at = Instant::now();
        let request = PendingRequest {
            method: method.into(),
            issued_at,
            deadline: timeout.map(|timeout| issued_at + timeout),
            completion,
        };
        self.pending.insert(id.clone(), request);

        Ok(id)
    }

    /// Resolve the request with `id`
    ///
    /// An unknown id (never issued, already settled, or timed out) is dropped
    /// and counted; no completion fires.
    pub fn resolve(&mut self, id: &Id, result: RemoteResult) -> Option<Settled> {
        match self.pending.remove(id) {
            Some(request) => Some(request.complete(result.into_result())),
            None => {
                self.dropped_responses += 1;
                tracing::warn!(id = %id, "Dropping response for unknown request id");
                None
            }
        }
    }

    /// Fail a single request, e.g. when its frame could not be written
    pub fn fail(&mut self, id: &Id, error: Error) -> Option<Settled> {
        self.pending
            .remove(id)
            .map(|request| request.complete(Err(error)))
    }

    /// Fail every pending request and refuse further registrations
    pub fn fail_all(&mut self, error: Error) -> Vec<Settled> {
        self.closed = true;
        self.pending
            .drain()
            .map(|(_, request)| request.complete(Err(error.clone())))
            .collect()
    }

    /// Time out every request whose deadline is at or before `now`
    pub fn expire(&mut self, now: Instant) -> Vec<Settled> {
        let expired: Vec<Id> = self
            .pending
            .iter()
            .filter(|(_, request)| request.deadline.is_some_and(|deadline| deadline <= now))
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.fail(&id, Error::Timeout))
            .collect()
    }

    /// Earliest deadline among pending requests
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .filter_map(|request| request.deadline)
            .min()
    }

    /// Number of requests awaiting a response
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True after `fail_all`
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Responses dropped because their id was unknown
    pub fn dropped_responses(&self) -> u64 {
        self.dropped_responses
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edb_core::{RemoteError, TransportError};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(String, Result<Value>)>>>;

    fn recorder(log: &Log, tag: &str) -> Completion {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Box::new(move |result| log.lock().unwrap().push((tag, result)))
    }

    #[test]
    fn test_register_allocates_distinct_ids() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        let a = dispatcher.register("erisdb.genPrivAccount", recorder(&log, "a"), None).unwrap();
        let b = dispatcher.register("erisdb.genPrivAccount", recorder(&log, "b"), None).unwrap();

        assert_ne!(a, b);
        assert_eq!(dispatcher.pending_count(), 2);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_success_and_failure() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        let ok = dispatcher.register("erisdb.isListening", recorder(&log, "ok"), None).unwrap();
        let err = dispatcher.register("erisdb.getAccount", recorder(&log, "err"), None).unwrap();

        let settled = dispatcher
            .resolve(&err, RemoteResult::Failure(RemoteError::new(-32603, "boom")))
            .unwrap();
        assert_eq!(settled.error_kind, Some("remote"));
        assert_eq!(settled.method, "erisdb.getAccount");

        let settled = dispatcher
            .resolve(&ok, RemoteResult::Success(json!({"listening": true})))
            .unwrap();
        assert!(settled.is_ok());

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        // Fired in resolution order, not registration order
        assert_eq!(log[0].0, "err");
        assert!(matches!(&log[0].1, Err(Error::Remote(e)) if e.code == -32603));
        assert_eq!(log[1].0, "ok");
        assert_eq!(log[1].1.as_ref().unwrap()["listening"], true);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_unknown_and_duplicate_ids_are_dropped() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        let id = dispatcher.register("erisdb.getMoniker", recorder(&log, "m"), None).unwrap();
        assert!(dispatcher.resolve(&id, RemoteResult::Success(json!({"moniker": "a"}))).is_some());
        assert!(dispatcher.resolve(&id, RemoteResult::Success(json!({"moniker": "b"}))).is_none());
        assert!(dispatcher.resolve(&Id::Number(999), RemoteResult::Success(Value::Null)).is_none());

        assert_eq!(dispatcher.dropped_responses(), 2);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_fail_all_then_register_is_refused() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        for i in 0..3 {
            dispatcher.register("erisdb.getPeers", recorder(&log, &i.to_string()), None).unwrap();
        }

        let error = Error::Transport(TransportError::Closed {
            code: Some(1006),
            reason: String::new(),
        });
        let settled = dispatcher.fail_all(error);
        assert_eq!(settled.len(), 3);
        assert_eq!(dispatcher.pending_count(), 0);
        assert!(dispatcher.is_closed());
        assert!(log.lock().unwrap().iter().all(|(_, r)| matches!(r, Err(Error::Transport(_)))));

        let result = dispatcher.register("erisdb.getPeers", recorder(&log, "late"), None);
        assert!(matches!(result, Err(Error::ClientClosed)));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 4);
        assert!(matches!(log[3], (ref tag, Err(Error::ClientClosed)) if tag == "late"));
    }

    #[test]
    fn test_fail_single_request() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        let id = dispatcher.register("erisdb.call", recorder(&log, "c"), None).unwrap();
        let settled = dispatcher
            .fail(&id, Error::Transport(TransportError::Send("broken pipe".into())))
            .unwrap();

        assert_eq!(settled.error_kind, Some("transport"));
        assert!(dispatcher.fail(&id, Error::Timeout).is_none());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_panicking_completion_does_not_stop_fail_all() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        dispatcher.register("erisdb.getMoniker", recorder(&log, "a"), None).unwrap();
        dispatcher
            .register("erisdb.getMoniker", Box::new(|_| panic!("completion failed")), None)
            .unwrap();
        dispatcher.register("erisdb.getMoniker", recorder(&log, "b"), None).unwrap();

        let settled = dispatcher.fail_all(Error::Transport(TransportError::Socket("reset".into())));

        assert_eq!(settled.len(), 3);
        assert_eq!(dispatcher.pending_count(), 0);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_past_deadlines_only() {
        let mut dispatcher = Dispatcher::new();
        let log = Log::default();

        let short = dispatcher
            .register("erisdb.sendAndHold", recorder(&log, "short"), Some(Duration::from_millis(100)))
            .unwrap();
        dispatcher
            .register("erisdb.getChainId", recorder(&log, "long"), Some(Duration::from_secs(5)))
            .unwrap();
        dispatcher.register("erisdb.getMoniker", recorder(&log, "none"), None).unwrap();

        let first = dispatcher.next_deadline().unwrap();
        tokio::time::advance(Duration::from_millis(150)).await;

        let expired = dispatcher.expire(Instant::now());
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].method, "erisdb.sendAndHold");
        assert_eq!(expired[0].error_kind, Some("timeout"));
        assert!(dispatcher.next_deadline().unwrap() > first);
        assert_eq!(dispatcher.pending_count(), 2);

        // A late response for the expired id is dropped
        assert!(dispatcher.resolve(&short, RemoteResult::Success(Value::Null)).is_none());

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert!(matches!(log[0], (ref tag, Err(Error::Timeout)) if tag == "short"));
    }
}
