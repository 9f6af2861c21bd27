//! Bookmark add/remove against the remote store.

use std::sync::Arc;

use atelier_core::bookmark::{BookmarkMetadata, BookmarkStore};
use atelier_core::error::{AtelierError, ErrorKind, Result};
use atelier_core::notification::{Notification, Notifier};

use crate::subscription::SyncHandle;

/// The write a toggle issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Added,
    Removed,
}

/// Issues one remote write per toggle and reports the outcome.
///
/// The visible bookmark state is never touched here: it changes when the
/// bookmark channel re-emits after the write lands. Overlapping toggles of
/// the same entry are sent independently and the store's last write wins.
pub struct BookmarkToggle {
    store: Arc<dyn BookmarkStore>,
    sync: SyncHandle,
    notifier: Notifier,
}

impl BookmarkToggle {
    pub fn new(store: Arc<dyn BookmarkStore>, sync: SyncHandle, notifier: Notifier) -> Self {
        Self {
            store,
            sync,
            notifier,
        }
    }

    /// Adds `entry_id` when it is not bookmarked, removes it otherwise.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` when no identity is signed in (no write is issued).
    /// - `WriteFailed` when the store rejects the write.
    pub async fn toggle(&self, entry_id: &str) -> Result<ToggleAction> {
        let Some(identity) = self.sync.identity() else {
            tracing::info!(entry_id, "bookmark toggle without identity");
            self.notifier.notify(Notification::error(
                ErrorKind::AuthRequired,
                "Sign-in required",
            ));
            return Err(AtelierError::auth_required(
                "bookmarks need a signed-in identity",
            ));
        };

        // Decided from the latest snapshot, before the write suspends
        let action = if self.sync.is_bookmarked(entry_id) {
            ToggleAction::Removed
        } else {
            ToggleAction::Added
        };

        let written = match action {
            ToggleAction::Added => {
                self.store
                    .put(&identity, entry_id, BookmarkMetadata::now())
                    .await
            }
            ToggleAction::Removed => self.store.delete(&identity, entry_id).await,
        };

        match written {
            Ok(()) => {
                tracing::info!(entry_id, ?action, "bookmark write settled");
                self.notifier.notify(match action {
                    ToggleAction::Added => {
                        Notification::success("Added", "The tool was added to your bookmarks.")
                    }
                    ToggleAction::Removed => Notification::success(
                        "Removed",
                        "The tool was removed from your bookmarks.",
                    ),
                });
                Ok(action)
            }
            Err(err) => {
                tracing::warn!("Error toggling bookmark {}: {}", entry_id, err);
                self.notifier
                    .notify(Notification::error(ErrorKind::WriteFailed, "Error"));
                Err(AtelierError::write_failed(err.to_string()))
            }
        }
    }
}
