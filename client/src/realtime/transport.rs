//! Transport seam between the realtime client and a concrete socket library.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::ProviderSink;
use crate::error::TransportError;

/// Connection settings handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Use the websocket transport only, no long-polling
    pub websocket_only: bool,
    /// Let the transport reconnect on its own after a drop
    pub reconnection: bool,
    /// Delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Reconnect attempts before the transport gives up
    pub max_reconnect_attempts: u8,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            websocket_only: true,
            reconnection: true,
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 5,
            connect_timeout: Duration::from_secs(20),
        }
    }
}

/// Something the transport reports about its connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Connection established
    Connect,
    /// Connection closed
    Disconnect { reason: String },
    /// A connection attempt failed
    ConnectError { error: String },
    /// Transport-level error on an open connection
    Error(Value),
    /// Named event sent by the server
    Message { name: String, payload: Value },
}

/// Opens realtime connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to `url` and report its events to `sink`.
    ///
    /// The sink may already receive events before this returns.
    async fn open(
        &self,
        url: &str,
        options: &TransportOptions,
        sink: ProviderSink,
    ) -> Result<Arc<dyn TransportHandle>, TransportError>;
}

/// An open realtime connection.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    /// Send a named event to the server.
    async fn emit(&self, event: &str, data: Value) -> Result<(), TransportError>;

    /// Close the connection.
    async fn close(&self) -> Result<(), TransportError>;
}
