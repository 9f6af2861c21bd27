use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atelier_core::bookmark::BookmarkSet;
use atelier_core::catalog::CatalogEntry;
use atelier_core::channel::Unsubscribe;
use atelier_core::identity::{IdentityId, IdentitySignal};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Which channels should be open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Authentication has not settled; nothing is open.
    #[default]
    Unready,
    /// Catalog channel open, no identity to scope bookmarks to.
    ReadyNoIdentity,
    /// Both channels open, bookmarks scoped to the identity.
    ReadyWithIdentity(IdentityId),
}

impl LifecycleState {
    pub fn from_signal(signal: &IdentitySignal) -> Self {
        match (signal.ready, &signal.identity) {
            (false, _) => Self::Unready,
            (true, None) => Self::ReadyNoIdentity,
            (true, Some(identity)) => Self::ReadyWithIdentity(identity.clone()),
        }
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Unready)
    }

    pub fn identity(&self) -> Option<&IdentityId> {
        match self {
            Self::ReadyWithIdentity(identity) => Some(identity),
            _ => None,
        }
    }
}

/// What observers see after every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncSnapshot {
    pub state: LifecycleState,
    /// Seed catalog reconciled with the latest remote snapshot.
    pub catalog: Vec<CatalogEntry>,
    pub bookmarks: BookmarkSet,
}

/// A channel the manager currently holds open.
pub(super) struct OpenChannel {
    pub(super) token: CancellationToken,
    pub(super) unsubscribe: Unsubscribe,
}

impl OpenChannel {
    /// Stops the pump first so nothing is applied after the close.
    pub(super) fn close(mut self) {
        self.token.cancel();
        self.unsubscribe.unsubscribe();
    }
}

pub(super) struct SyncState {
    pub(super) lifecycle: LifecycleState,
    pub(super) seed: Vec<CatalogEntry>,
    pub(super) catalog: Vec<CatalogEntry>,
    pub(super) bookmarks: BookmarkSet,
    pub(super) catalog_channel: Option<OpenChannel>,
    pub(super) bookmark_channel: Option<OpenChannel>,
    pub(super) publisher: watch::Sender<SyncSnapshot>,
}

impl SyncState {
    pub(super) fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            state: self.lifecycle.clone(),
            catalog: self.catalog.clone(),
            bookmarks: self.bookmarks.clone(),
        }
    }

    pub(super) fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}

pub(super) type SharedSyncState = Arc<Mutex<SyncState>>;

pub(super) fn lock(shared: &SharedSyncState) -> MutexGuard<'_, SyncState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only access to the synchronized state for other components.
#[derive(Clone)]
pub struct SyncHandle {
    pub(super) shared: SharedSyncState,
}

impl SyncHandle {
    /// The signed-in identity, only while the manager is `ReadyWithIdentity`.
    pub fn identity(&self) -> Option<IdentityId> {
        lock(&self.shared).lifecycle.identity().cloned()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        lock(&self.shared).lifecycle.clone()
    }

    pub fn is_bookmarked(&self, entry_id: &str) -> bool {
        lock(&self.shared).bookmarks.contains(entry_id)
    }

    pub fn bookmarks(&self) -> BookmarkSet {
        lock(&self.shared).bookmarks.clone()
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        lock(&self.shared).catalog.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        lock(&self.shared).snapshot()
    }

    /// Receiver notified after every applied change.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        lock(&self.shared).publisher.subscribe()
    }
}
