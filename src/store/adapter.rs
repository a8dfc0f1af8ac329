//! Backend selection and typed access to the store
//!
//! The adapter routes every operation to the remote realtime backend when
//! it is enabled and fully configured, and to the local [`MockStore`]
//! otherwise. Remote initialization happens lazily on first use and at most
//! once at a time: concurrent first calls share a single connection attempt
//! and, if it fails, all fall back to the mock together.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::core::config::RemoteConfig;
use crate::store::backend::{
    BackendInitError, DynKvBackend, Listener, StoreError, Subscription,
};
use crate::store::mock::MockStore;
use crate::store::path::{Collection, StorePath};
use crate::store::remote::DynRemoteConnector;

/// Which backend the adapter is currently routing to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote disabled or not configured
    Mock,
    /// Remote enabled but not yet initialized
    Pending,
    /// Connected to the remote store
    Remote,
    /// Remote initialization failed; the mock serves every call
    MockFallback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendKind::Mock => "local",
            BackendKind::Pending => "remote (not connected yet)",
            BackendKind::Remote => "remote",
            BackendKind::MockFallback => "local (remote unavailable)",
        };
        write!(f, "{}", label)
    }
}

/// Single entry point for reads, writes and subscriptions
pub struct StoreAdapter {
    mock: Arc<MockStore>,
    remote: RemoteConfig,
    connector: Option<DynRemoteConnector>,
    handle: OnceCell<DynKvBackend>,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreAdapter")
            .field("kind", &self.backend_kind())
            .field("attempts", &self.init_attempts())
            .finish()
    }
}

impl StoreAdapter {
    pub fn new(
        mock: Arc<MockStore>,
        remote: RemoteConfig,
        connector: Option<DynRemoteConnector>,
    ) -> Self {
        Self {
            mock,
            remote,
            connector,
            handle: OnceCell::new(),
            failures: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// An adapter that never leaves the mock
    pub fn mock_only(mock: Arc<MockStore>) -> Self {
        Self::new(mock, RemoteConfig::default(), None)
    }

    pub fn mock(&self) -> &Arc<MockStore> {
        &self.mock
    }

    /// Remote enabled and fully configured
    pub fn remote_active(&self) -> bool {
        self.remote.is_active()
    }

    /// Remote connection attempts started so far
    pub fn init_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn backend_kind(&self) -> BackendKind {
        if !self.remote_active() {
            BackendKind::Mock
        } else if self.handle.initialized() {
            BackendKind::Remote
        } else if self.failures.load(Ordering::SeqCst) > 0 {
            BackendKind::MockFallback
        } else {
            BackendKind::Pending
        }
    }

    /// Run remote initialization now instead of on first use
    pub async fn ensure_ready(&self) -> BackendKind {
        self.backend().await;
        self.backend_kind()
    }

    async fn backend(&self) -> DynKvBackend {
        let fallback: DynKvBackend = self.mock.clone();
        if !self.remote_active() {
            return fallback;
        }
        if let Some(handle) = self.handle.get() {
            return handle.clone();
        }

        let seen = self.failures.load(Ordering::SeqCst);
        if seen > 0 && !self.remote.retry_failed_init() {
            return fallback;
        }

        match self.handle.get_or_try_init(|| self.connect(seen)).await {
            Ok(handle) => handle.clone(),
            Err(BackendInitError::Superseded) => fallback,
            Err(e) => {
                let config = self
                    .remote
                    .masked_report()
                    .into_iter()
                    .map(|(field, value)| format!("{}={}", field, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::error!(
                    error = %e,
                    %config,
                    "remote store initialization failed, falling back to local store"
                );
                fallback
            }
        }
    }

    async fn connect(&self, seen: usize) -> Result<DynKvBackend, BackendInitError> {
        // a waiter whose leader already failed must not start a second attempt
        if self.failures.load(Ordering::SeqCst) != seen {
            return Err(BackendInitError::Superseded);
        }

        self.attempts.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("initializing remote store");
        let result = match &self.connector {
            None => Err(BackendInitError::MissingTransport),
            Some(connector) => connector.connect(&self.remote).await,
        };
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        } else {
            tracing::info!("remote store connected");
        }
        result
    }

    pub async fn read(&self, path: StorePath) -> Result<Option<Value>, StoreError> {
        self.backend().await.read(path).await
    }

    pub async fn write(&self, path: StorePath, value: Value) -> Result<(), StoreError> {
        self.backend().await.write(path, value).await
    }

    pub async fn subscribe(
        &self,
        path: StorePath,
        listener: Listener,
    ) -> Result<Subscription, StoreError> {
        self.backend().await.subscribe(path, listener).await
    }

    /// Read and decode a collection; absent values load as the default
    pub async fn load<C: Collection>(&self) -> Result<C::Value, StoreError> {
        let raw = self.read(C::PATH).await?;
        C::decode_opt(raw).map_err(|e| StoreError::Decode {
            path: C::PATH,
            message: e.to_string(),
        })
    }

    /// Encode and write a whole collection
    pub async fn save<C: Collection>(&self, value: &C::Value) -> Result<(), StoreError> {
        let raw = serde_json::to_value(value).map_err(|e| StoreError::Encode {
            path: C::PATH,
            message: e.to_string(),
        })?;
        self.write(C::PATH, raw).await
    }

    /// Subscribe to a collection with decoded values
    ///
    /// A push that does not decode is logged and skipped.
    pub async fn watch<C, F>(&self, on_change: F) -> Result<Subscription, StoreError>
    where
        C: Collection + 'static,
        F: Fn(C::Value) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(move |raw| match C::decode_opt(raw) {
            Ok(value) => on_change(value),
            Err(e) => tracing::warn!(path = %C::PATH, error = %e, "ignoring malformed update"),
        });
        self.subscribe(C::PATH, listener).await
    }
}
