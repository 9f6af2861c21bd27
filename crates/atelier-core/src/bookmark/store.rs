//! Bookmark write contract.

use async_trait::async_trait;

use super::model::BookmarkMetadata;
use crate::error::Result;
use crate::identity::IdentityId;

/// Remote store accepting bookmark writes.
///
/// Writes never touch local state. Their effect becomes visible only when
/// the bookmark channel for the same identity re-emits.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Records `entry_id` as bookmarked by `identity`.
    async fn put(
        &self,
        identity: &IdentityId,
        entry_id: &str,
        metadata: BookmarkMetadata,
    ) -> Result<()>;

    /// Removes the bookmark for `entry_id`. Removing a missing bookmark succeeds.
    async fn delete(&self, identity: &IdentityId, entry_id: &str) -> Result<()>;
}
