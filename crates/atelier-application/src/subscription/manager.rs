use std::sync::{Arc, Mutex};

use atelier_core::catalog::{CatalogEntry, CollectionRef, reconcile};
use atelier_core::channel::{BookmarkChannel, CatalogChannel, ChannelEvent};
use atelier_core::error::{AtelierError, ErrorKind, Result};
use atelier_core::identity::{IdentityId, IdentitySignal};
use atelier_core::notification::{Notification, Notifier};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::state::{LifecycleState, OpenChannel, SharedSyncState, SyncHandle, SyncState, lock};

/// Keeps the catalog and bookmark channels in step with identity readiness.
///
/// Every transition closes what must close before anything new opens, and
/// the bookmark set is cleared as part of that close, so a new identity
/// never sees the previous identity's bookmarks. Channel emissions are the
/// only writers of the merged catalog and the bookmark set.
pub struct SubscriptionManager {
    catalog_channel: Arc<dyn CatalogChannel>,
    bookmark_channel: Arc<dyn BookmarkChannel>,
    collection: CollectionRef,
    shared: SharedSyncState,
    notifier: Notifier,
}

impl SubscriptionManager {
    /// Creates a manager in the `Unready` state showing only the seed catalog.
    pub fn new(
        catalog_channel: Arc<dyn CatalogChannel>,
        bookmark_channel: Arc<dyn BookmarkChannel>,
        app_id: &str,
        seed: Vec<CatalogEntry>,
        notifier: Notifier,
    ) -> Self {
        let catalog = reconcile(&seed, &[]);
        let (publisher, _) = watch::channel(Default::default());
        let state = SyncState {
            lifecycle: LifecycleState::Unready,
            seed,
            catalog,
            bookmarks: Default::default(),
            catalog_channel: None,
            bookmark_channel: None,
            publisher,
        };
        state.publish();

        Self {
            catalog_channel,
            bookmark_channel,
            collection: CollectionRef::catalog(app_id),
            shared: Arc::new(Mutex::new(state)),
            notifier,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            shared: self.shared.clone(),
        }
    }

    /// Moves to the state implied by `signal`.
    ///
    /// Repeating the current state is a no-op. If a channel cannot be
    /// opened, a `ChannelError` notification is sent, the lifecycle still
    /// moves, and the error is returned.
    pub fn apply_identity(&self, signal: &IdentitySignal) -> Result<()> {
        let target = LifecycleState::from_signal(signal);
        let mut state = lock(&self.shared);
        if state.lifecycle == target {
            return Ok(());
        }

        tracing::info!(from = ?state.lifecycle, to = ?target, "identity transition");

        // Close before open
        if state.lifecycle.identity() != target.identity() {
            if let Some(channel) = state.bookmark_channel.take() {
                channel.close();
                tracing::debug!("bookmark channel closed");
            }
            state.bookmarks.clear();
        }
        if !target.is_ready() {
            if let Some(channel) = state.catalog_channel.take() {
                channel.close();
                tracing::debug!("catalog channel closed");
            }
        }
        state.lifecycle = target.clone();

        let mut first_error = None;
        if target.is_ready() && state.catalog_channel.is_none() {
            if let Err(err) = self.open_catalog(&mut *state) {
                first_error.get_or_insert(err);
            }
        }
        if let Some(identity) = target.identity() {
            if state.bookmark_channel.is_none() {
                if let Err(err) = self.open_bookmarks(&mut *state, identity) {
                    first_error.get_or_insert(err);
                }
            }
        }

        state.publish();
        first_error.map_or(Ok(()), Err)
    }

    /// Applies every readiness change until the signal's sender is dropped.
    pub async fn follow(&self, mut signals: watch::Receiver<IdentitySignal>) {
        loop {
            let signal = signals.borrow_and_update().clone();
            if let Err(err) = self.apply_identity(&signal) {
                tracing::warn!("Failed to apply identity signal: {}", err);
            }
            if signals.changed().await.is_err() {
                break;
            }
        }
    }

    /// Closes every channel and returns to `Unready`. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let mut state = lock(&self.shared);
        if let Some(channel) = state.bookmark_channel.take() {
            channel.close();
        }
        if let Some(channel) = state.catalog_channel.take() {
            channel.close();
        }
        state.bookmarks.clear();
        if state.lifecycle != LifecycleState::Unready {
            state.lifecycle = LifecycleState::Unready;
            state.publish();
        }
    }

    fn open_catalog(&self, state: &mut SyncState) -> Result<()> {
        let subscription = self
            .catalog_channel
            .subscribe(&self.collection)
            .inspect_err(|err| self.report_open_failure("tools", err))?;
        let (events, unsubscribe) = subscription.into_parts();

        let token = CancellationToken::new();
        let notifier = self.notifier.clone();
        spawn_pump(
            self.shared.clone(),
            token.clone(),
            events,
            move |state: &mut SyncState, event| match event {
                ChannelEvent::Snapshot(remote) => {
                    tracing::debug!(entries = remote.len(), "catalog snapshot");
                    state.catalog = reconcile(&state.seed, &remote);
                }
                ChannelEvent::Error(message) => {
                    let err = AtelierError::channel("tools", message);
                    tracing::warn!("Error fetching tools: {}", err);
                    notifier.notify(Notification::error(err.kind(), "Failed to load tools"));
                }
            },
        );

        state.catalog_channel = Some(OpenChannel { token, unsubscribe });
        tracing::debug!(collection = %self.collection, "catalog channel opened");
        Ok(())
    }

    fn open_bookmarks(&self, state: &mut SyncState, identity: &IdentityId) -> Result<()> {
        let subscription = self
            .bookmark_channel
            .subscribe(identity)
            .inspect_err(|err| self.report_open_failure("bookmarks", err))?;
        let (events, unsubscribe) = subscription.into_parts();

        let token = CancellationToken::new();
        let notifier = self.notifier.clone();
        spawn_pump(
            self.shared.clone(),
            token.clone(),
            events,
            move |state: &mut SyncState, event| match event {
                ChannelEvent::Snapshot(bookmarks) => {
                    tracing::debug!(count = bookmarks.len(), "bookmark snapshot");
                    state.bookmarks = bookmarks;
                }
                ChannelEvent::Error(message) => {
                    let err = AtelierError::channel("bookmarks", message);
                    tracing::warn!("Error fetching bookmarks: {}", err);
                    notifier.notify(Notification::error(err.kind(), "Failed to load bookmarks"));
                }
            },
        );

        state.bookmark_channel = Some(OpenChannel { token, unsubscribe });
        tracing::debug!(%identity, "bookmark channel opened");
        Ok(())
    }

    fn report_open_failure(&self, what: &str, err: &AtelierError) {
        tracing::warn!("Failed to subscribe to {}: {}", what, err);
        self.notifier.notify(Notification::error(
            ErrorKind::ChannelError,
            format!("Failed to load {what}"),
        ));
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drains one channel into the shared state until its token is cancelled.
///
/// The token is re-checked under the state lock, so an emission that raced
/// a close is discarded rather than applied.
fn spawn_pump<T, F>(
    shared: SharedSyncState,
    token: CancellationToken,
    mut events: mpsc::UnboundedReceiver<ChannelEvent<T>>,
    apply: F,
) where
    T: Send + 'static,
    F: Fn(&mut SyncState, ChannelEvent<T>) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let mut state = lock(&shared);
            if token.is_cancelled() {
                break;
            }
            apply(&mut *state, event);
            state.publish();
        }
    });
}
