//! Push-style subscription channels.
//!
//! A channel delivers complete snapshots of a remote collection, in the order
//! the store produces them, until it is unsubscribed. Errors are delivered in
//! band and do not close the channel.

use tokio::sync::mpsc;

use crate::bookmark::BookmarkSet;
use crate::catalog::{CatalogEntry, CollectionRef};
use crate::error::Result;
use crate::identity::IdentityId;

/// One emission from a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<T> {
    /// Complete point-in-time contents of the collection.
    Snapshot(T),
    /// The store reported an error; the subscription stays open.
    Error(String),
}

/// Closes a subscription.
///
/// Calling [`Unsubscribe::unsubscribe`] more than once is a no-op, and
/// dropping the handle unsubscribes if that has not happened yet, so every
/// subscribe is matched by exactly one close.
pub struct Unsubscribe {
    close: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Unsubscribe {
    pub fn new(close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            close: Some(Box::new(close)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { close: None }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(close) = self.close.take() {
            close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_none()
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An open subscription: the event stream plus its close handle.
#[derive(Debug)]
pub struct Subscription<T> {
    events: mpsc::UnboundedReceiver<ChannelEvent<T>>,
    unsubscribe: Unsubscribe,
}

impl<T> Subscription<T> {
    pub fn new(events: mpsc::UnboundedReceiver<ChannelEvent<T>>, unsubscribe: Unsubscribe) -> Self {
        Self {
            events,
            unsubscribe,
        }
    }

    /// Waits for the next emission. `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<ChannelEvent<T>> {
        self.events.recv().await
    }

    /// Returns an already-delivered emission without waiting.
    pub fn try_next(&mut self) -> Option<ChannelEvent<T>> {
        self.events.try_recv().ok()
    }

    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<ChannelEvent<T>>, Unsubscribe) {
        (self.events, self.unsubscribe)
    }
}

/// Source of public catalog snapshots.
pub trait CatalogChannel: Send + Sync + 'static {
    fn subscribe(&self, collection: &CollectionRef) -> Result<Subscription<Vec<CatalogEntry>>>;
}

/// Source of per-identity bookmark snapshots.
pub trait BookmarkChannel: Send + Sync + 'static {
    fn subscribe(&self, identity: &IdentityId) -> Result<Subscription<BookmarkSet>>;
}
