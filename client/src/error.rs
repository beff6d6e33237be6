//! Unified error handling for the client.
//!
//! None of these errors reach callers of the realtime or notification
//! operations: the realtime client turns them into published events and the
//! registrar logs them. They exist so the code inside those boundaries can use
//! `?` and so the binary has a single error type.

use std::time::Duration;

use crate::config::ConfigError;

/// Errors raised by a realtime transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid realtime URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Close failed: {0}")]
    Close(String),
}

impl TransportError {
    /// Whether the server could not be reached, as opposed to the connection
    /// never being set up in the first place.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Errors raised while registering for push notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Permission request failed: {0}")]
    Permission(String),

    #[error("Push token unavailable: {0}")]
    Token(String),

    #[error("Token registration failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
