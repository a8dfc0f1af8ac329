//! The key-value contract shared by every backend

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::store::path::StorePath;

/// Boxed future returned by backend operations
pub type BoxFut<'a, T> = futures::future::BoxFuture<'a, T>;

/// Subscription callback, invoked with the full value at the path
/// (`None` when the path holds nothing)
pub type Listener = Arc<dyn Fn(Option<Value>) + Send + Sync + 'static>;

/// Handle returned by `subscribe`
///
/// Callers must invoke [`Subscription::unsubscribe`] on teardown. Dropping
/// the handle without it leaves the callback registered.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving callbacks
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Path-addressed read / write / subscribe
///
/// Writes to the same path from the same client reach that client's
/// subscription callbacks in the order they were issued.
pub trait KvBackend: fmt::Debug + Send + Sync {
    /// Current value at `path`
    fn read(&self, path: StorePath) -> BoxFut<'_, Result<Option<Value>, StoreError>>;

    /// Replace the value at `path`; writing `Value::Null` removes it
    fn write(&self, path: StorePath, value: Value) -> BoxFut<'_, Result<(), StoreError>>;

    /// Observe `path`: the listener receives the current value, then every
    /// later value written to exactly this path
    fn subscribe(
        &self,
        path: StorePath,
        listener: Listener,
    ) -> BoxFut<'_, Result<Subscription, StoreError>>;
}

pub type DynKvBackend = Arc<dyn KvBackend>;

/// Failures surfaced to callers of store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("write to '{path}' rejected: {message}")]
    Write { path: StorePath, message: String },

    #[error("read of '{path}' failed: {message}")]
    Read { path: StorePath, message: String },

    #[error("value at '{path}' has an unexpected shape: {message}")]
    Decode { path: StorePath, message: String },

    #[error("could not encode value for '{path}': {message}")]
    Encode { path: StorePath, message: String },
}

/// Remote connection setup failures
///
/// Never returned to store callers: the adapter logs them and falls back
/// to the mock backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendInitError {
    #[error("remote store is enabled but no realtime transport is linked into this build")]
    MissingTransport,

    #[error("remote connection failed: {0}")]
    Connect(String),

    #[error("an earlier initialization attempt failed while this one was waiting")]
    Superseded,
}
