//! Subscription lifecycle: opening and closing the catalog and bookmark
//! channels as identity readiness changes.

mod manager;
mod state;

pub use manager::SubscriptionManager;
pub use state::{LifecycleState, SyncHandle, SyncSnapshot};
