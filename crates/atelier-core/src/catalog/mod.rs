//! Catalog domain: entries, the reconciler, and directory queries.

pub mod model;
pub mod query;
pub mod reconcile;

pub use model::{CatalogEntry, CollectionRef};
pub use query::{ALL_CATEGORIES, CatalogQuery, bookmarked_entries, categories};
pub use reconcile::reconcile;
