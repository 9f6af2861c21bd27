//! Bookmark domain: the per-identity set and the remote write contract.

pub mod model;
pub mod store;

pub use model::{BookmarkMetadata, BookmarkSet};
pub use store::BookmarkStore;
