//! Document Store
//!
//! A path-addressable JSON tree (`sections`, `content/hero`, ...) with
//! whole-document writes and per-path live subscriptions.
//!
//! Writes are serialized. Each write is applied to a copy of the tree,
//! persisted to the snapshot file (if any), swapped in, and then published to
//! every subscription whose path overlaps the written path. A failed persist
//! leaves the tree untouched.

pub mod subscription;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tokio::sync::watch;

pub use subscription::{subscribe_with, Subscription, SubscriptionClosed, SubscriptionHandle};

/// Characters the store does not accept in keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']'];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store path '{0}'")]
    InvalidPath(String),

    #[error("failed to persist snapshot {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load snapshot {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    root: RwLock<Value>,
    /// Serializes writers; held across the snapshot write
    writer: tokio::sync::Mutex<()>,
    publishers: Mutex<FxHashMap<String, watch::Sender<Value>>>,
    /// Never sent on; backs subscriptions to paths that cannot be written
    inert: watch::Sender<Value>,
    snapshot: Option<PathBuf>,
}

impl DocumentStore {
    /// Volatile store, used by tests and previews.
    pub fn in_memory() -> Self {
        Self::with_root(Value::Object(Map::new()), None)
    }

    /// Store backed by a JSON snapshot file. A missing file starts empty.
    pub fn open(snapshot: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let snapshot = snapshot.into();

        let root = if snapshot.exists() {
            let contents = std::fs::read_to_string(&snapshot).map_err(|e| StoreError::Load {
                path: snapshot.clone(),
                message: e.to_string(),
            })?;
            let root: Value = serde_json::from_str(&contents).map_err(|e| StoreError::Load {
                path: snapshot.clone(),
                message: e.to_string(),
            })?;
            tracing::info!("Loaded document store from {}", snapshot.display());
            root
        } else {
            tracing::info!("No snapshot at {}, starting empty", snapshot.display());
            Value::Object(Map::new())
        };

        Ok(Self::with_root(root, Some(snapshot)))
    }

    fn with_root(root: Value, snapshot: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(root),
                writer: tokio::sync::Mutex::new(()),
                publishers: Mutex::new(FxHashMap::default()),
                inert: watch::channel(Value::Object(Map::new())).0,
                snapshot,
            }),
        }
    }

    /// Document at `path`, or `None` when nothing is stored there.
    pub fn get(&self, path: &str) -> Option<Value> {
        let segments = split_path(path).ok()?;
        value_at(&self.read_root(), &segments).cloned()
    }

    pub fn is_empty(&self) -> bool {
        match &*self.read_root() {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Replace the document at `path` in one write. `null` deletes it.
    pub async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = split_path(path)?;

        let _writer = self.inner.writer.lock().await;

        let mut next = self.read_root().clone();
        write_at(&mut next, &segments, value);

        if let Some(snapshot) = &self.inner.snapshot {
            persist(snapshot, &next).await?;
        }

        *self
            .inner
            .root
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;

        tracing::debug!("Wrote /{}", segments.join("/"));
        self.publish(&segments);
        Ok(())
    }

    /// Follow `path`. The subscription starts with the current document
    /// (`{}` when the path does not exist).
    pub fn subscribe(&self, path: &str) -> Subscription {
        let segments = match split_path(path) {
            Ok(segments) => segments,
            Err(e) => {
                tracing::debug!("{}, following an empty document", e);
                return Subscription::new(path.to_string(), self.inner.inert.subscribe());
            }
        };
        let key = segments.join("/");

        let mut publishers = self.lock_publishers();
        let receiver = match publishers.get(&key) {
            Some(sender) => sender.subscribe(),
            None => {
                let current = document_at(&self.read_root(), &segments);
                let (sender, receiver) = watch::channel(current);
                publishers.insert(key.clone(), sender);
                receiver
            }
        };

        Subscription::new(key, receiver)
    }

    /// Live listeners across all paths. Publishers without listeners are
    /// pruned first.
    pub fn listener_count(&self) -> usize {
        let mut publishers = self.lock_publishers();
        publishers.retain(|_, sender| sender.receiver_count() > 0);
        publishers.values().map(|sender| sender.receiver_count()).sum()
    }

    fn publish(&self, written: &[String]) {
        let mut publishers = self.lock_publishers();
        publishers.retain(|_, sender| sender.receiver_count() > 0);

        let root = self.read_root();
        for (path, sender) in publishers.iter() {
            let watched: Vec<String> = path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !overlaps(&watched, written) {
                continue;
            }

            let current = document_at(&root, &watched);
            let delivered = sender.send_if_modified(|held| {
                if *held == current {
                    false
                } else {
                    *held = current;
                    true
                }
            });
            if delivered {
                tracing::debug!("Published /{} ({} listeners)", path, sender.receiver_count());
            }
        }
    }

    fn read_root(&self) -> RwLockReadGuard<'_, Value> {
        self.inner.root.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_publishers(&self) -> MutexGuard<'_, FxHashMap<String, watch::Sender<Value>>> {
        self.inner.publishers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Path Helpers
// ============================================================================

fn split_path(path: &str) -> Result<Vec<String>, StoreError> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if segments.iter().any(|s| s.contains(FORBIDDEN_KEY_CHARS)) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// One path is a prefix of the other, so a write at one changes the other.
fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

fn value_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn document_at(root: &Value, segments: &[String]) -> Value {
    value_at(root, segments)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn write_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        *root = if value.is_null() { Value::Object(Map::new()) } else { value };
        return;
    };

    let mut node = root;
    for segment in parents {
        node = as_object(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = as_object(node);
    if value.is_null() {
        map.shift_remove(leaf);
    } else {
        map.insert(leaf.clone(), value);
    }
}

async fn persist(path: &Path, root: &Value) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let bytes = serde_json::to_vec_pretty(root)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempdir::TempDir;

    #[tokio::test]
    async fn test_set_and_get_nested() {
        let store = DocumentStore::in_memory();
        store.set("content/hero", json!({ "title": "Hello" })).await.unwrap();

        assert_eq!(store.get("content/hero").unwrap()["title"], "Hello");
        assert_eq!(store.get("/content/hero/title").unwrap(), "Hello");
        assert!(store.get("content/about").is_none());
    }

    #[tokio::test]
    async fn test_set_null_deletes() {
        let store = DocumentStore::in_memory();
        store.set("content/hero", json!({ "title": "x" })).await.unwrap();
        store.set("content/hero", Value::Null).await.unwrap();
        assert!(store.get("content/hero").is_none());
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let store = DocumentStore::in_memory();
        let result = store.set("content/he.ro", json!({})).await;
        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_invalid_path_subscription_stays_empty() {
        let store = DocumentStore::in_memory();
        store.set("content/hero", json!({ "title": "Private" })).await.unwrap();

        let mut subscription = store.subscribe("content/he.ro");
        assert_eq!(subscription.latest(), json!({}));

        store.set("content/hero", json!({ "title": "Changed" })).await.unwrap();
        store.set("sections", json!({})).await.unwrap();
        assert!(!subscription.has_changed());
        assert_eq!(subscription.peek(), json!({}));
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_write_delivers_once() {
        let store = DocumentStore::in_memory();
        let mut subscription = store.subscribe("content/contact");
        assert!(!subscription.has_changed());

        store.set("content/contact", json!({ "title": "Reach Me" })).await.unwrap();

        subscription.changed().await.unwrap();
        assert_eq!(subscription.latest()["title"], "Reach Me");
        assert!(!subscription.has_changed());
    }

    #[tokio::test]
    async fn test_identical_write_is_not_published() {
        let store = DocumentStore::in_memory();
        store.set("content/hero", json!({ "title": "Same" })).await.unwrap();

        let subscription = store.subscribe("content/hero");
        store.set("content/hero", json!({ "title": "Same" })).await.unwrap();
        assert!(!subscription.has_changed());
    }

    #[tokio::test]
    async fn test_ancestor_and_descendant_writes_publish() {
        let store = DocumentStore::in_memory();
        let parent = store.subscribe("sections");
        let child = store.subscribe("sections/projects");

        store
            .set("sections", json!({ "projects": { "name": "Projects", "enabled": true } }))
            .await
            .unwrap();
        assert!(parent.has_changed());
        assert!(child.has_changed());

        let mut parent = parent;
        parent.latest();
        store
            .set("sections/projects", json!({ "name": "Projects", "enabled": false }))
            .await
            .unwrap();
        assert!(parent.has_changed());
        assert_eq!(parent.peek()["projects"]["enabled"], false);
    }

    #[tokio::test]
    async fn test_unrelated_write_is_not_published() {
        let store = DocumentStore::in_memory();
        let subscription = store.subscribe("content/hero");
        store.set("content/about", json!({ "title": "x" })).await.unwrap();
        assert!(!subscription.has_changed());
    }

    #[tokio::test]
    async fn test_dropped_subscriptions_release_listeners() {
        let store = DocumentStore::in_memory();
        let a = store.subscribe("content/hero");
        let b = store.subscribe("content/hero");
        let c = store.subscribe("sections");
        assert_eq!(store.listener_count(), 3);

        a.unsubscribe();
        drop(c);
        assert_eq!(store.listener_count(), 1);

        drop(b);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_persists_across_open() {
        let dir = TempDir::new("store").unwrap();
        let path = dir.path().join("store.json");

        let store = DocumentStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set("sections/hero", json!({ "name": "Hero", "enabled": true })).await.unwrap();

        let reopened = DocumentStore::open(&path).unwrap();
        assert_eq!(reopened.get("sections/hero").unwrap()["enabled"], true);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_tree_unchanged() {
        let dir = TempDir::new("store").unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = DocumentStore::open(blocker.join("store.json")).unwrap();
        let subscription = store.subscribe("content/hero");

        let result = store.set("content/hero", json!({ "title": "x" })).await;
        assert!(matches!(result, Err(StoreError::Persist { .. })));
        assert!(store.get("content/hero").is_none());
        assert!(!subscription.has_changed());
    }
}
