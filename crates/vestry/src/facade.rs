//! The Vestry facade: one object tying the remote API to the local store.
//!
//! Every operation makes a single remote attempt through the
//! [`RemoteFirstAccessor`] and falls back to the shared [`LocalStore`] when
//! that attempt fails. The result says which side answered.

use std::sync::Arc;

use tokio::sync::broadcast;
use vestry_core::CollectionName;
use vestry_remote::{HttpTransport, RemoteConfig, RemoteFirstAccessor, Transport};
use vestry_store::{KeyValueBackend, LocalStore, StoreEvent};

use crate::config::VestryConfig;
use crate::error::{Result, VestryError};
use crate::resource::{Document, Donations, Members, Resource};

/// The main Vestry struct.
///
/// Holds the store by `Arc` so several facades (or other consumers) can
/// share one store per process.
pub struct Vestry<B: KeyValueBackend, T: Transport> {
    store: Arc<LocalStore<B>>,
    remote: RemoteFirstAccessor<T>,
}

impl<B: KeyValueBackend, T: Transport> Vestry<B, T> {
    /// Wrap an already opened store.
    pub fn new(store: Arc<LocalStore<B>>, transport: T, config: &RemoteConfig) -> Self {
        Self {
            store,
            remote: RemoteFirstAccessor::new(transport, config.timeout),
        }
    }

    /// Open a store over `backend` and wrap it.
    pub fn open(backend: B, transport: T, config: VestryConfig) -> Result<Self> {
        let store = LocalStore::open(backend, config.store)?;
        tracing::info!(base_url = %config.remote.base_url, "vestry opened");
        Ok(Self::new(Arc::new(store), transport, &config.remote))
    }

    /// The shared local store.
    pub fn store(&self) -> &Arc<LocalStore<B>> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        self.remote.transport()
    }

    pub(crate) fn remote(&self) -> &RemoteFirstAccessor<T> {
        &self.remote
    }

    /// Notifications for restore and reset of the local store.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource handles
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle for a keyed collection.
    pub fn resource(&self, name: CollectionName) -> Result<Resource<'_, B, T>> {
        if name.is_singleton() {
            return Err(VestryError::Unsupported {
                collection: name,
                op: "keyed access",
            });
        }
        Ok(Resource::new(self, name))
    }

    /// Handle for a singleton configuration document.
    pub fn document(&self, name: CollectionName) -> Result<Document<'_, B, T>> {
        if !name.is_singleton() {
            return Err(VestryError::Unsupported {
                collection: name,
                op: "document access",
            });
        }
        Ok(Document::new(self, name))
    }

    pub fn members(&self) -> Members<'_, B, T> {
        Members::new(Resource::new(self, CollectionName::Members))
    }

    pub fn donations(&self) -> Donations<'_, B, T> {
        Donations::new(Resource::new(self, CollectionName::Donations))
    }

    pub fn news(&self) -> Resource<'_, B, T> {
        Resource::new(self, CollectionName::News)
    }

    pub fn leaders(&self) -> Resource<'_, B, T> {
        Resource::new(self, CollectionName::Leaders)
    }

    pub fn announcements(&self) -> Resource<'_, B, T> {
        Resource::new(self, CollectionName::Announcements)
    }

    pub fn departments(&self) -> Resource<'_, B, T> {
        Resource::new(self, CollectionName::Departments)
    }

    pub fn contacts(&self) -> Resource<'_, B, T> {
        Resource::new(self, CollectionName::Contacts)
    }

    pub fn home(&self) -> Document<'_, B, T> {
        Document::new(self, CollectionName::Home)
    }

    pub fn about(&self) -> Document<'_, B, T> {
        Document::new(self, CollectionName::About)
    }
}

impl<B: KeyValueBackend> Vestry<B, HttpTransport> {
    /// Open a store and talk to the API over HTTP.
    pub fn connect(backend: B, config: VestryConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.remote)?;
        Self::open(backend, transport, config)
    }
}
