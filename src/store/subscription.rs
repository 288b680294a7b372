//! Live Content Subscription
//!
//! A subscription follows one store path. It always holds the latest document
//! at that path; intermediate writes may be skipped, but the newest value is
//! never lost. Dropping the subscription releases the listener.

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::DocumentStore;

/// The store that fed this subscription has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("subscription closed")]
pub struct SubscriptionClosed;

/// Pull-style subscription to a store path.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    receiver: watch::Receiver<Value>,
}

impl Subscription {
    pub(crate) fn new(path: String, receiver: watch::Receiver<Value>) -> Self {
        Self { path, receiver }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current document, marking it as seen.
    pub fn latest(&mut self) -> Value {
        self.receiver.borrow_and_update().clone()
    }

    /// Current document without marking it as seen.
    pub fn peek(&self) -> Value {
        self.receiver.borrow().clone()
    }

    /// True when a publication arrived since the last `latest()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next publication.
    pub async fn changed(&mut self) -> Result<(), SubscriptionClosed> {
        self.receiver.changed().await.map_err(|_| SubscriptionClosed)
    }

    /// Release the listener. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

/// Handle for a callback subscription; dropping it stops delivery.
#[derive(Debug)]
pub struct SubscriptionHandle {
    path: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn unsubscribe(self) {}
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Callback form of `DocumentStore::subscribe`.
///
/// `handler` runs immediately with the current document, then once per
/// publication on a spawned task. Must be called inside a Tokio runtime.
pub fn subscribe_with<F>(store: &DocumentStore, path: &str, mut handler: F) -> SubscriptionHandle
where
    F: FnMut(Value) + Send + 'static,
{
    let mut subscription = store.subscribe(path);
    let path = subscription.path().to_string();
    handler(subscription.latest());

    let task = tokio::spawn(async move {
        while subscription.changed().await.is_ok() {
            handler(subscription.latest());
        }
    });

    SubscriptionHandle { path, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    async fn wait_for(seen: &Arc<Mutex<Vec<Value>>>, count: usize) {
        for _ in 0..100 {
            if seen.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_callback_receives_current_then_updates() {
        let store = DocumentStore::in_memory();
        store.set("content/hero", json!({ "title": "One" })).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = subscribe_with(&store, "content/hero", move |doc| {
            sink.lock().unwrap().push(doc);
        });

        // Immediate delivery happens before subscribe_with returns
        assert_eq!(seen.lock().unwrap()[0]["title"], "One");

        store.set("content/hero", json!({ "title": "Two" })).await.unwrap();
        wait_for(&seen, 2).await;
        assert_eq!(seen.lock().unwrap()[1]["title"], "Two");

        handle.unsubscribe();
    }

    #[tokio::test]
    async fn test_unsubscribed_handler_is_silent() {
        let store = DocumentStore::in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = subscribe_with(&store, "content/about", move |doc| {
            sink.lock().unwrap().push(doc);
        });
        assert_eq!(seen.lock().unwrap().len(), 1);

        handle.unsubscribe();
        store.set("content/about", json!({ "title": "Later" })).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_path_delivers_empty_object() {
        let store = DocumentStore::in_memory();
        let mut subscription = store.subscribe("content/nothing");
        assert_eq!(subscription.latest(), json!({}));
    }
}
