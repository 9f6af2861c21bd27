use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry ids bookmarked by one identity.
///
/// Always a copy of the latest bookmark channel snapshot; nothing else
/// writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkSet {
    ids: BTreeSet<String>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.ids.contains(entry_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl FromIterator<String> for BookmarkSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Document body stored alongside a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkMetadata {
    pub timestamp: DateTime<Utc>,
}

impl BookmarkMetadata {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}
