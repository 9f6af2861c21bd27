//! In-memory stand-in for the remote document store.
//!
//! Behaves like a push-style store: subscribing delivers the current
//! snapshot right away, and every mutation re-emits a full snapshot to the
//! affected listeners in mutation order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use atelier_core::bookmark::{BookmarkMetadata, BookmarkSet, BookmarkStore};
use atelier_core::catalog::{CatalogEntry, CollectionRef};
use atelier_core::channel::{
    BookmarkChannel, CatalogChannel, ChannelEvent, Subscription, Unsubscribe,
};
use atelier_core::error::{AtelierError, Result};
use atelier_core::identity::IdentityId;
use tokio::sync::mpsc;

struct Listener<T> {
    id: u64,
    sender: mpsc::UnboundedSender<ChannelEvent<T>>,
}

impl<T: Clone> Listener<T> {
    /// Returns false when the receiving side is gone.
    fn send(&self, event: ChannelEvent<T>) -> bool {
        self.sender.send(event).is_ok()
    }
}

#[derive(Default)]
struct StoreState {
    catalog: Vec<CatalogEntry>,
    bookmarks: HashMap<IdentityId, BTreeMap<String, BookmarkMetadata>>,
    catalog_listeners: Vec<Listener<Vec<CatalogEntry>>>,
    bookmark_listeners: HashMap<IdentityId, Vec<Listener<BookmarkSet>>>,
    next_listener_id: u64,
    fail_writes: bool,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_listener_id += 1;
        self.next_listener_id
    }

    fn bookmark_snapshot(&self, identity: &IdentityId) -> BookmarkSet {
        self.bookmarks
            .get(identity)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn emit_catalog(&mut self, event: ChannelEvent<Vec<CatalogEntry>>) {
        self.catalog_listeners
            .retain(|listener| listener.send(event.clone()));
    }

    fn emit_bookmarks(&mut self, identity: &IdentityId, event: ChannelEvent<BookmarkSet>) {
        if let Some(listeners) = self.bookmark_listeners.get_mut(identity) {
            listeners.retain(|listener| listener.send(event.clone()));
        }
    }
}

/// Shared, cloneable in-memory store.
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    app_id: String,
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRemoteStore {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// Starts with `entries` already in the remote catalog.
    pub fn with_catalog(app_id: impl Into<String>, entries: Vec<CatalogEntry>) -> Self {
        let store = Self::new(app_id);
        store.lock().catalog = entries;
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Catalog administration
    // ============================================================================

    /// Inserts or replaces a remote catalog record and re-emits.
    pub fn upsert_catalog_entry(&self, entry: CatalogEntry) {
        let mut state = self.lock();
        match state.catalog.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => state.catalog.push(entry),
        }
        let snapshot = state.catalog.clone();
        state.emit_catalog(ChannelEvent::Snapshot(snapshot));
    }

    /// Removes a remote catalog record and re-emits. Returns false when absent.
    pub fn remove_catalog_entry(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.catalog.len();
        state.catalog.retain(|e| e.id != id);
        let removed = state.catalog.len() != before;
        if removed {
            let snapshot = state.catalog.clone();
            state.emit_catalog(ChannelEvent::Snapshot(snapshot));
        }
        removed
    }

    // ============================================================================
    // Fault injection
    // ============================================================================

    /// Delivers an error to every catalog listener without closing them.
    pub fn emit_catalog_error(&self, message: impl Into<String>) {
        self.lock().emit_catalog(ChannelEvent::Error(message.into()));
    }

    /// Delivers an error to the bookmark listeners of `identity`.
    pub fn emit_bookmark_error(&self, identity: &IdentityId, message: impl Into<String>) {
        self.lock()
            .emit_bookmarks(identity, ChannelEvent::Error(message.into()));
    }

    /// Makes every subsequent bookmark write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    pub fn catalog_listener_count(&self) -> usize {
        self.lock().catalog_listeners.len()
    }

    pub fn bookmark_listener_count(&self, identity: &IdentityId) -> usize {
        self.lock()
            .bookmark_listeners
            .get(identity)
            .map_or(0, Vec::len)
    }

    pub fn total_bookmark_listeners(&self) -> usize {
        self.lock().bookmark_listeners.values().map(Vec::len).sum()
    }

    /// Stored bookmarks of `identity`, as the channel would emit them.
    pub fn bookmarks_of(&self, identity: &IdentityId) -> BookmarkSet {
        self.lock().bookmark_snapshot(identity)
    }

    fn check_writable(&self) -> Result<()> {
        if self.lock().fail_writes {
            return Err(AtelierError::write_failed("store rejected the write"));
        }
        Ok(())
    }
}

fn remove_catalog_listener(state: &Weak<Mutex<StoreState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.catalog_listeners.retain(|listener| listener.id != id);
    }
}

fn remove_bookmark_listener(state: &Weak<Mutex<StoreState>>, identity: &IdentityId, id: u64) {
    if let Some(state) = state.upgrade() {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(listeners) = state.bookmark_listeners.get_mut(identity) {
            listeners.retain(|listener| listener.id != id);
            if listeners.is_empty() {
                state.bookmark_listeners.remove(identity);
            }
        }
    }
}

impl CatalogChannel for InMemoryRemoteStore {
    fn subscribe(&self, collection: &CollectionRef) -> Result<Subscription<Vec<CatalogEntry>>> {
        if *collection != CollectionRef::catalog(&self.app_id) {
            return Err(AtelierError::not_found("collection", collection.as_str()));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_id();
        let _ = sender.send(ChannelEvent::Snapshot(state.catalog.clone()));
        state.catalog_listeners.push(Listener { id, sender });
        drop(state);

        tracing::debug!(listener = id, %collection, "catalog listener added");
        let weak = Arc::downgrade(&self.state);
        Ok(Subscription::new(
            receiver,
            Unsubscribe::new(move || remove_catalog_listener(&weak, id)),
        ))
    }
}

impl BookmarkChannel for InMemoryRemoteStore {
    fn subscribe(&self, identity: &IdentityId) -> Result<Subscription<BookmarkSet>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_id();
        let _ = sender.send(ChannelEvent::Snapshot(state.bookmark_snapshot(identity)));
        state
            .bookmark_listeners
            .entry(identity.clone())
            .or_default()
            .push(Listener { id, sender });
        drop(state);

        tracing::debug!(
            listener = id,
            collection = %CollectionRef::bookmarks(&self.app_id, identity.as_str()),
            "bookmark listener added"
        );
        let weak = Arc::downgrade(&self.state);
        let identity = identity.clone();
        Ok(Subscription::new(
            receiver,
            Unsubscribe::new(move || remove_bookmark_listener(&weak, &identity, id)),
        ))
    }
}

#[async_trait]
impl BookmarkStore for InMemoryRemoteStore {
    async fn put(
        &self,
        identity: &IdentityId,
        entry_id: &str,
        metadata: BookmarkMetadata,
    ) -> Result<()> {
        // Writes settle asynchronously, like a real round trip
        tokio::task::yield_now().await;
        self.check_writable()?;

        let mut state = self.lock();
        state
            .bookmarks
            .entry(identity.clone())
            .or_default()
            .insert(entry_id.to_string(), metadata);
        let snapshot = state.bookmark_snapshot(identity);
        state.emit_bookmarks(identity, ChannelEvent::Snapshot(snapshot));
        Ok(())
    }

    async fn delete(&self, identity: &IdentityId, entry_id: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.check_writable()?;

        let mut state = self.lock();
        if let Some(docs) = state.bookmarks.get_mut(identity) {
            docs.remove(entry_id);
        }
        let snapshot = state.bookmark_snapshot(identity);
        state.emit_bookmarks(identity, ChannelEvent::Snapshot(snapshot));
        Ok(())
    }
}
