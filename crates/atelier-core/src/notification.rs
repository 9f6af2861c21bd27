//! User-visible notifications.
//!
//! Every error the core handles ends in exactly one notification, so nothing
//! is swallowed silently.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: Option<ErrorKind>,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            message: message.into(),
            kind: None,
        }
    }

    /// Error notification carrying the kind's fallback message.
    pub fn error(kind: ErrorKind, title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: kind.fallback_message().to_string(),
            kind: Some(kind),
        }
    }
}

/// Sending half of the notification stream.
///
/// Cheap to clone. Sending after the receiver is gone is a no-op.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiver the UI drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn notify(&self, notification: Notification) {
        tracing::debug!(
            level = ?notification.level,
            title = %notification.title,
            "notification"
        );
        // Non-blocking send - if the receiver is dropped, we just skip
        let _ = self.sender.send(notification);
    }
}
