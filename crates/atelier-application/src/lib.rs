//! Application layer for Atelier.
//!
//! Coordinates the domain types with the remote collaborators: keeps the
//! catalog and bookmark views in sync with their channels, issues bookmark
//! writes, and runs generation tasks.

pub mod bookmark_toggle;
pub mod generation;
pub mod subscription;

pub use bookmark_toggle::{BookmarkToggle, ToggleAction};
pub use generation::{GenerationOrchestrator, OrchestratorSettings, RejectReason, StartOutcome};
pub use subscription::{LifecycleState, SubscriptionManager, SyncHandle, SyncSnapshot};
