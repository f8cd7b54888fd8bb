//! Handlers for unsolicited frames
//!
//! A node may push frames that carry a `method` and no id, such as new-block
//! events. They never touch the correlation table; the connection event loop
//! hands them to this registry, which runs the matching handler on its own
//! task so a slow handler cannot hold up response delivery.
//!
//! # Examples
//!
//! ```rust,no_run
//! use edb_client::Client;
//!
//! # async fn example(client: &Client) {
//! client.on_notification("NewBlock", |notification| async move {
//!     println!("new block: {:?}", notification.params);
//! }).await;
//! # }
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// An unsolicited frame pushed by the node
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Event or method name
    pub method: String,
    /// Event payload, if any
    pub params: Option<Value>,
}

/// Type for notification handler functions
pub type NotificationFn =
    Arc<dyn Fn(Notification) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Registry of notification handlers keyed by method
#[derive(Clone, Default)]
pub struct NotificationHandler {
    handlers: Arc<Mutex<HashMap<String, NotificationFn>>>,
}

impl NotificationHandler {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for `method`
    pub async fn register<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: NotificationFn = Arc::new(move |notification| Box::pin(handler(notification)));
        self.handlers.lock().await.insert(method.into(), handler);
    }

    /// Spawn the handler for `notification`; false when none is registered
    pub async fn dispatch(&self, notification: Notification) -> bool {
        let handler = self.handlers.lock().await.get(&notification.method).cloned();

        match handler {
            Some(handler) => {
                tokio::spawn(handler(notification));
                true
            }
            None => {
                tracing::debug!(method = %notification.method, "No handler for notification");
                false
            }
        }
    }

    /// Check if a handler is registered for a method
    pub async fn has_handler(&self, method: &str) -> bool {
        self.handlers.lock().await.contains_key(method)
    }

    /// Remove the handler for a method
    pub async fn unregister(&self, method: &str) -> bool {
        self.handlers.lock().await.remove(method).is_some()
    }
}
