//! Domain layer for Atelier.
//!
//! Holds the data model shared by every other crate: catalog entries and the
//! reconciler, bookmark sets, generation tasks, the history log, the error
//! taxonomy, and the traits that describe the remote collaborators.

pub mod bookmark;
pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod identity;
pub mod notification;

// Re-export common error type
pub use error::{AtelierError, ErrorKind};
