//! Storage layer - path-addressed key-value backends behind one adapter
//!
//! Two interchangeable backends share the [`KvBackend`] contract: the
//! local [`MockStore`] (in-process tree mirrored to a JSON file) and a
//! remote realtime store reached through a [`RemoteConnector`]. The
//! [`StoreAdapter`] picks one per configuration, connects to the remote
//! lazily with a single in-flight attempt, and silently falls back to the
//! mock when that attempt fails.

pub mod adapter;
pub mod backend;
pub mod mock;
pub mod path;
pub mod remote;

pub use adapter::{BackendKind, StoreAdapter};
pub use backend::{
    BackendInitError, BoxFut, DynKvBackend, KvBackend, Listener, StoreError, Subscription,
};
pub use mock::MockStore;
pub use path::{Collection, CurrentUnit, Passkey, PersonnelGroups, StorePath, UnitList};
pub use remote::{DynRemoteConnector, MemRemoteConnector, MemRemoteHub, RemoteConnector};
