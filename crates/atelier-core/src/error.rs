//! Error types for the Atelier application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The user-facing failure taxonomy.
///
/// Every failure the core surfaces is classified into one of these kinds.
/// The kind decides which notification the user sees and whether a task
/// ends in the `failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The action needs an identity that is not present.
    AuthRequired,
    /// A subscription emitted an error.
    ChannelError,
    /// A bookmark write was rejected by the store.
    WriteFailed,
    /// A generative endpoint answered with a shape that does not match its contract.
    MalformedResponse,
    /// The generation request itself failed (transport, status, timeout).
    NetworkError,
}

impl ErrorKind {
    /// Message shown to the user when a task or action fails with this kind.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Please sign in to save your favourite tools.",
            Self::ChannelError => "Failed to load the latest data. Showing what we have so far.",
            Self::WriteFailed => "Failed to update the bookmark.",
            Self::MalformedResponse => {
                "Sorry, the generator could not produce a result. Please try again."
            }
            Self::NetworkError => {
                "An error occurred while contacting the AI service. Please check your connection and try again."
            }
        }
    }
}

/// A shared error type for the entire Atelier application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AtelierError {
    /// Action requires a signed-in identity
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// A subscription channel reported an error
    #[error("Channel error on '{channel}': {message}")]
    Channel { channel: String, message: String },

    /// A remote write was rejected
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Endpoint response did not match its contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure of an outbound request
    #[error("Network error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an AuthRequired error
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::AuthRequired(message.into())
    }

    /// Creates a Channel error
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Creates a WriteFailed error
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed(message.into())
    }

    /// Creates a MalformedResponse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Creates a Network error
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Classification
    // ============================================================================

    /// Maps this error onto the user-facing taxonomy.
    ///
    /// Ambient failures (IO, config, serialization) have no kind of their own;
    /// the ones that can reach a generation task are reported as
    /// `MalformedResponse` or `NetworkError` depending on where they came from.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthRequired(_) => ErrorKind::AuthRequired,
            Self::Channel { .. } => ErrorKind::ChannelError,
            Self::WriteFailed(_) => ErrorKind::WriteFailed,
            Self::MalformedResponse(_) | Self::Serialization { .. } => {
                ErrorKind::MalformedResponse
            }
            Self::Network { .. }
            | Self::Io { .. }
            | Self::NotFound { .. }
            | Self::Config(_)
            | Self::Internal(_) => ErrorKind::NetworkError,
        }
    }

    /// Check if this is an AuthRequired error
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AtelierError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AtelierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AtelierError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AtelierError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, AtelierError>`.
pub type Result<T> = std::result::Result<T, AtelierError>;
