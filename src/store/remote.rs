//! Remote realtime backend
//!
//! The realtime wire protocol lives behind [`RemoteConnector`]: a connector
//! turns the remote configuration into a connected [`KvBackend`]. A write
//! from any client is pushed asynchronously to every client observing that
//! path, the writer included; there is no optimistic local echo.
//!
//! [`MemRemoteHub`] is the in-process realtime store shipped with the
//! crate. It only connects clients within the same process, which is what
//! the sync tests and local multi-client sessions need.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::core::config::RemoteConfig;
use crate::store::backend::{
    BackendInitError, BoxFut, DynKvBackend, KvBackend, Listener, StoreError, Subscription,
};
use crate::store::path::StorePath;

/// Sets up a connection to a remote realtime store
pub trait RemoteConnector: std::fmt::Debug + Send + Sync {
    fn connect<'a>(
        &'a self,
        config: &'a RemoteConfig,
    ) -> BoxFut<'a, Result<DynKvBackend, BackendInitError>>;
}

pub type DynRemoteConnector = Arc<dyn RemoteConnector>;

type Push = Option<Value>;

#[derive(Debug, Default)]
struct HubState {
    values: HashMap<StorePath, Value>,
    subscribers: HashMap<StorePath, Vec<(u64, mpsc::UnboundedSender<Push>)>>,
    next_subscriber: u64,
}

/// In-process realtime store shared by any number of clients
#[derive(Debug, Default)]
pub struct MemRemoteHub {
    state: Mutex<HubState>,
    connections: AtomicUsize,
    reject_writes: AtomicBool,
}

impl MemRemoteHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A connector whose clients talk to this hub
    pub fn connector(self: &Arc<Self>) -> MemRemoteConnector {
        MemRemoteConnector {
            hub: self.clone(),
            latency: Duration::ZERO,
            failure: None,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current value at `path` as the hub sees it
    pub fn value(&self, path: StorePath) -> Option<Value> {
        self.lock().values.get(&path).cloned()
    }

    /// Number of clients that connected successfully
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn put(&self, path: StorePath, value: Value) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path,
                message: "permission denied".to_string(),
            });
        }

        let mut state = self.lock();
        let pushed = if value.is_null() {
            state.values.remove(&path);
            None
        } else {
            state.values.insert(path, value.clone());
            Some(value)
        };

        // fan out while holding the lock so every subscriber sees writes
        // in the order the hub applied them
        if let Some(subs) = state.subscribers.get_mut(&path) {
            subs.retain(|(_, tx)| tx.send(pushed.clone()).is_ok());
        }
        Ok(())
    }

    fn register(&self, path: StorePath) -> (u64, mpsc::UnboundedReceiver<Push>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        let _ = tx.send(state.values.get(&path).cloned());
        state.subscribers.entry(path).or_default().push((id, tx));
        (id, rx)
    }

    fn unregister(&self, path: StorePath, id: u64) {
        if let Some(subs) = self.lock().subscribers.get_mut(&path) {
            subs.retain(|(sid, _)| *sid != id);
        }
    }
}

/// Connector for [`MemRemoteHub`], with knobs for latency and failure
#[derive(Debug, Clone)]
pub struct MemRemoteConnector {
    hub: Arc<MemRemoteHub>,
    latency: Duration,
    failure: Option<String>,
    attempts: Arc<AtomicUsize>,
}

impl MemRemoteConnector {
    /// Delay every connection attempt
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every connection attempt fail with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Connection attempts made through this connector (and its clones)
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RemoteConnector for MemRemoteConnector {
    fn connect<'a>(
        &'a self,
        config: &'a RemoteConfig,
    ) -> BoxFut<'a, Result<DynKvBackend, BackendInitError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if let Some(message) = &self.failure {
                return Err(BackendInitError::Connect(message.clone()));
            }

            self.hub.connections.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(
                project = config.project_id.as_deref().unwrap_or_default(),
                "connected to in-process realtime hub"
            );
            let client: DynKvBackend = Arc::new(MemRemoteClient {
                hub: self.hub.clone(),
            });
            Ok(client)
        })
    }
}

#[derive(Debug)]
struct MemRemoteClient {
    hub: Arc<MemRemoteHub>,
}

impl KvBackend for MemRemoteClient {
    fn read(&self, path: StorePath) -> BoxFut<'_, Result<Option<Value>, StoreError>> {
        Box::pin(async move { Ok(self.hub.value(path)) })
    }

    fn write(&self, path: StorePath, value: Value) -> BoxFut<'_, Result<(), StoreError>> {
        Box::pin(async move {
            tracing::debug!(%path, "remote write");
            self.hub.put(path, value)
        })
    }

    fn subscribe(
        &self,
        path: StorePath,
        listener: Listener,
    ) -> BoxFut<'_, Result<Subscription, StoreError>> {
        Box::pin(async move {
            let (id, mut rx) = self.hub.register(path);
            tokio::spawn(async move {
                while let Some(value) = rx.recv().await {
                    listener(value);
                }
            });

            let hub = self.hub.clone();
            Ok(Subscription::new(move || hub.unregister(path, id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    fn config() -> RemoteConfig {
        RemoteConfig {
            enabled: Some(true),
            api_key: Some("key".into()),
            database_url: Some("mem://hub".into()),
            project_id: Some("roster-test".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_write_is_pushed_to_every_client_including_writer() {
        let hub = MemRemoteHub::new();
        let connector = hub.connector();
        let cfg = config();
        let a = connector.connect(&cfg).await.unwrap();
        let b = connector.connect(&cfg).await.unwrap();
        assert_eq!(hub.connections(), 2);

        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        let sub_a = a
            .subscribe(StorePath::CurrentUnitId, Arc::new(move |v: Option<Value>| {
                let _ = tx_a.send(v);
            }))
            .await
            .unwrap();
        let sub_b = b
            .subscribe(StorePath::CurrentUnitId, Arc::new(move |v: Option<Value>| {
                let _ = tx_b.send(v);
            }))
            .await
            .unwrap();

        assert_eq!(rx_a.recv().await.unwrap(), None);
        assert_eq!(rx_b.recv().await.unwrap(), None);

        a.write(StorePath::CurrentUnitId, json!("hq")).await.unwrap();
        assert_eq!(rx_a.recv().await.unwrap(), Some(json!("hq")));
        assert_eq!(rx_b.recv().await.unwrap(), Some(json!("hq")));
        assert_eq!(b.read(StorePath::CurrentUnitId).await.unwrap(), Some(json!("hq")));

        sub_a.unsubscribe();
        sub_b.unsubscribe();
    }

    #[tokio::test]
    async fn test_same_path_writes_arrive_in_order() {
        let hub = MemRemoteHub::new();
        let client = hub.connector().connect(&config()).await.unwrap();

        let (tx, mut rx) = unbounded_channel();
        let sub = client
            .subscribe(StorePath::Units, Arc::new(move |v: Option<Value>| {
                let _ = tx.send(v);
            }))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), None);

        for i in 0..20 {
            client.write(StorePath::Units, json!([i])).await.unwrap();
        }
        for i in 0..20 {
            assert_eq!(rx.recv().await.unwrap(), Some(json!([i])));
        }
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_failing_connector() {
        let hub = MemRemoteHub::new();
        let connector = hub.connector().failing("unreachable");
        let err = connector.connect(&config()).await.unwrap_err();
        assert_eq!(err, BackendInitError::Connect("unreachable".into()));
        assert_eq!(connector.attempts(), 1);
        assert_eq!(hub.connections(), 0);
    }

    #[tokio::test]
    async fn test_rejected_write() {
        let hub = MemRemoteHub::new();
        let client = hub.connector().connect(&config()).await.unwrap();
        hub.reject_writes(true);
        let err = client.write(StorePath::Units, json!([])).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { path: StorePath::Units, .. }));
        assert_eq!(hub.value(StorePath::Units), None);
    }
}
