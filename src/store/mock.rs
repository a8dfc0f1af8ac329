//! Local mock backend
//!
//! An in-process JSON tree addressed by slash-delimited paths. Every write
//! is mirrored to a file on disk (best effort, failures are logged and
//! swallowed) and fanned out synchronously to listeners of that exact
//! path. One instance per process, injected into the adapter; tests build
//! as many independent instances as they like.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::store::backend::{BoxFut, KvBackend, Listener, StoreError, Subscription};
use crate::store::path::StorePath;

#[derive(Default)]
struct MockInner {
    tree: Map<String, Value>,
    listeners: HashMap<String, Vec<(u64, Listener)>>,
    next_listener: u64,
}

impl fmt::Debug for MockInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.listeners.values().map(Vec::len).sum();
        f.debug_struct("MockInner")
            .field("keys", &self.tree.keys().collect::<Vec<_>>())
            .field("listeners", &listeners)
            .finish()
    }
}

/// In-memory store with an optional durable JSON mirror
#[derive(Debug, Clone)]
pub struct MockStore {
    inner: Arc<Mutex<MockInner>>,
    mirror: Option<PathBuf>,
}

impl MockStore {
    /// A store with no durable mirror
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockInner::default())),
            mirror: None,
        }
    }

    /// A store mirrored to `path`, restored from it when present
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tree = restore(&path).unwrap_or_default();
        Self {
            inner: Arc::new(Mutex::new(MockInner {
                tree,
                ..Default::default()
            })),
            mirror: Some(path),
        }
    }

    /// Path of the durable mirror, if any
    pub fn mirror_path(&self) -> Option<&Path> {
        self.mirror.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Value at a slash-delimited path
    pub fn get(&self, path: &str) -> Option<Value> {
        let inner = self.lock();
        get_in(&inner.tree, &segments(path)).cloned()
    }

    /// Replace the value at a slash-delimited path and notify its listeners
    pub fn set(&self, path: &str, value: Value) {
        let parts = segments(path);
        if parts.is_empty() {
            return;
        }

        let (current, listeners) = {
            let mut inner = self.lock();
            set_in(&mut inner.tree, &parts, value);
            self.persist(&inner.tree);
            let current = get_in(&inner.tree, &parts).cloned();
            let listeners: Vec<Listener> = inner
                .listeners
                .get(path)
                .map(|l| l.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default();
            (current, listeners)
        };

        // callbacks run outside the lock so they may touch the store again
        for listener in listeners {
            listener(current.clone());
        }
    }

    /// Register a listener on an exact path; it fires immediately with the
    /// current value
    pub fn listen(&self, path: &str, listener: Listener) -> Subscription {
        let (id, current) = {
            let mut inner = self.lock();
            let id = inner.next_listener;
            inner.next_listener += 1;
            inner
                .listeners
                .entry(path.to_string())
                .or_default()
                .push((id, listener.clone()));
            (id, get_in(&inner.tree, &segments(path)).cloned())
        };

        listener(current);

        let weak = Arc::downgrade(&self.inner);
        let key = path.to_string();
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(list) = inner.listeners.get_mut(&key) {
                    list.retain(|(lid, _)| *lid != id);
                }
            }
        })
    }

    /// Wipe the tree and the durable mirror
    pub fn clear(&self) {
        self.lock().tree.clear();
        if let Some(path) = &self.mirror {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove mock store mirror");
                }
            }
        }
    }

    fn persist(&self, tree: &Map<String, Value>) {
        let Some(path) = &self.mirror else {
            return;
        };
        let result = serde_json::to_vec(tree)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                }
                std::fs::write(path, bytes).map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "mock store mirror not written");
        }
    }
}

impl KvBackend for MockStore {
    fn read(&self, path: StorePath) -> BoxFut<'_, Result<Option<Value>, StoreError>> {
        Box::pin(async move { Ok(self.get(path.key())) })
    }

    fn write(&self, path: StorePath, value: Value) -> BoxFut<'_, Result<(), StoreError>> {
        Box::pin(async move {
            tracing::debug!(%path, "mock write");
            self.set(path.key(), value);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        path: StorePath,
        listener: Listener,
    ) -> BoxFut<'_, Result<Subscription, StoreError>> {
        Box::pin(async move { Ok(self.listen(path.key(), listener)) })
    }
}

fn restore(path: &Path) -> Option<Map<String, Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "mock store mirror unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(tree) => Some(tree),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "mock store mirror is not valid JSON");
            None
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn get_in<'a>(tree: &'a Map<String, Value>, parts: &[&str]) -> Option<&'a Value> {
    let (first, rest) = parts.split_first()?;
    let mut current = tree.get(*first)?;
    for part in rest {
        current = current.as_object()?.get(*part)?;
    }
    (!current.is_null()).then_some(current)
}

fn set_in(tree: &mut Map<String, Value>, parts: &[&str], value: Value) {
    let Some((last, parents)) = parts.split_last() else {
        return;
    };

    let mut current = tree;
    for part in parents {
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }

    if value.is_null() {
        current.remove(*last);
    } else {
        current.insert(last.to_string(), value);
    }
}
