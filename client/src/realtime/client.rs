//! Realtime client and the sink transports report into.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use quakewatch_hub::{
    AttemptCount, ConnectionFailure, ConnectionState, ConnectionStatus, EventKind, Handler,
    ListenerRegistry, RealtimeEvent,
};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{ProviderEvent, Transport, TransportHandle, TransportOptions};

/// Disconnect reason published after an explicit [`RealtimeClient::disconnect`].
pub const CLIENT_DISCONNECT: &str = "io client disconnect";

/// State shared between the client and the sinks of its connections.
#[derive(Debug, Default)]
struct Core {
    listeners: ListenerRegistry,
    state: ConnectionState,
    /// Bumped on every `connect()` and `disconnect()`; older sinks go quiet.
    generation: AtomicU64,
}

impl Core {
    fn publish(&self, event: RealtimeEvent) {
        self.listeners.emit(&event);
    }

    /// Translate a provider event into state changes and a published event.
    fn handle(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::Connect => {
                tracing::info!("Realtime connection established");
                self.state.mark_connected();
                self.publish(RealtimeEvent::ConnectionStatus(ConnectionStatus::connected()));
            }
            ProviderEvent::Disconnect { reason } => {
                tracing::info!(reason = %reason, "Realtime connection closed");
                self.state.mark_disconnected();
                self.publish(RealtimeEvent::ConnectionStatus(
                    ConnectionStatus::disconnected(reason),
                ));
            }
            ProviderEvent::ConnectError { error } => {
                let attempts = self.state.record_failed_attempt();
                tracing::error!(error = %error, attempts, "Realtime connection error");
                self.publish(RealtimeEvent::ConnectionError(ConnectionFailure {
                    error,
                    attempts: Some(attempts),
                }));
            }
            ProviderEvent::Error(payload) => {
                tracing::error!(error = %payload, "Socket error");
                self.publish(RealtimeEvent::SocketError(payload));
            }
            ProviderEvent::Message { name, payload } => {
                tracing::debug!(event = %name, payload = %payload, "Received server event");
                match RealtimeEvent::from_data(&name, payload) {
                    Some(event) => self.publish(event),
                    None => tracing::debug!(event = %name, "Ignoring unknown server event"),
                }
            }
        }
    }
}

/// Handle a transport uses to report events for one connection.
///
/// Once the client reconnects or is dropped, events delivered through an old
/// sink are discarded.
#[derive(Debug, Clone)]
pub struct ProviderSink {
    core: Weak<Core>,
    generation: u64,
}

impl ProviderSink {
    /// Report a provider event.
    pub fn deliver(&self, event: ProviderEvent) {
        let Some(core) = self.core.upgrade() else {
            return;
        };

        if core.generation.load(Ordering::SeqCst) != self.generation {
            tracing::debug!(?event, "Dropping event from a replaced connection");
            return;
        }

        core.handle(event);
    }

    /// Whether events delivered through this sink still reach the client.
    pub fn is_attached(&self) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.generation.load(Ordering::SeqCst) == self.generation)
    }
}

/// Client for the QuakeWatch realtime server.
///
/// Keeps at most one connection open and fans its events out to local
/// subscribers registered with [`RealtimeClient::on`]. Connection problems
/// never surface as errors; subscribe to [`EventKind::ConnectionError`] and
/// [`EventKind::SocketError`] to observe them.
pub struct RealtimeClient {
    core: Arc<Core>,
    transport: Arc<dyn Transport>,
    options: TransportOptions,
    connection: Mutex<Option<Arc<dyn TransportHandle>>>,
}

impl RealtimeClient {
    /// Create a client with the default transport options.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_options(transport, TransportOptions::default())
    }

    pub fn with_options(transport: Arc<dyn Transport>, options: TransportOptions) -> Self {
        Self {
            core: Arc::new(Core::default()),
            transport,
            options,
            connection: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Connect to the realtime server at `url`.
    ///
    /// An existing connection is detached and closed first. Failures are
    /// published as `connection_error` events. A `disconnect()` issued while
    /// the transport is still opening cancels the attempt.
    pub async fn connect(&self, url: &str) {
        let mut connection = self.connection.lock().await;

        let generation = self.detach();

        if let Some(previous) = connection.take() {
            tracing::info!("Replacing existing realtime connection");
            if let Err(e) = previous.close().await {
                tracing::warn!(error = %e, "Failed to close previous realtime connection");
            }
            self.core.state.mark_disconnected();
        }

        tracing::info!(url = %url, "Connecting to realtime server");

        let sink = ProviderSink {
            core: Arc::downgrade(&self.core),
            generation,
        };

        match self.transport.open(url, &self.options, sink.clone()).await {
            Ok(handle) if sink.is_attached() => *connection = Some(handle),
            Ok(handle) => {
                tracing::info!("Connection attempt cancelled, closing");
                if let Err(e) = handle.close().await {
                    tracing::warn!(error = %e, "Failed to close cancelled realtime connection");
                }
            }
            Err(e) if !sink.is_attached() => {
                tracing::debug!(error = %e, "Cancelled connection attempt failed");
            }
            Err(e) if e.is_connect_failure() => {
                self.core.handle(ProviderEvent::ConnectError {
                    error: e.to_string(),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to set up realtime connection");
                self.core
                    .publish(RealtimeEvent::ConnectionError(ConnectionFailure {
                        error: e.to_string(),
                        attempts: None,
                    }));
            }
        }
    }

    /// Close the current connection, if any. Subscribers stay registered.
    ///
    /// Publishes `connection_status {connected: false}` with the reason
    /// `io client disconnect` when a connection was closed.
    pub async fn disconnect(&self) {
        // Detach before taking the lock so an in-flight connect gives up
        self.detach();

        let handle = self.connection.lock().await.take();
        let Some(handle) = handle else {
            return;
        };

        tracing::info!("Disconnecting from realtime server");
        if let Err(e) = handle.close().await {
            tracing::warn!(error = %e, "Failed to close realtime connection");
        }
        self.core.handle(ProviderEvent::Disconnect {
            reason: CLIENT_DISCONNECT.to_string(),
        });
    }

    /// Start a new generation; sinks handed out before this go quiet.
    fn detach(&self) -> u64 {
        self.core.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// A sink attached to the current generation.
    #[cfg(test)]
    pub(crate) fn attached_sink(&self) -> ProviderSink {
        ProviderSink {
            core: Arc::downgrade(&self.core),
            generation: self.core.generation.load(Ordering::SeqCst),
        }
    }

    /// Subscribe to `kind`. Keep the returned handler to unsubscribe.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Handler
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.core.listeners.on(kind, callback)
    }

    /// Subscribe an existing handler to `kind`.
    pub fn add_listener(&self, kind: EventKind, handler: Handler) {
        self.core.listeners.add(kind, handler);
    }

    /// Remove the first registration of `handler` from `kind`.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> bool {
        self.core.listeners.off(kind, handler)
    }

    /// Send an event to the server.
    ///
    /// Dropped with a warning when not connected; nothing is queued.
    pub async fn send_message(&self, event: &str, data: Value) {
        let handle = if self.core.state.is_connected() {
            self.connection.lock().await.clone()
        } else {
            None
        };

        let Some(handle) = handle else {
            tracing::warn!(event = %event, "No realtime connection, message dropped");
            return;
        };

        if let Err(e) = handle.emit(event, data).await {
            tracing::warn!(event = %event, error = %e, "Failed to send realtime message");
        }
    }

    /// Whether the server connection is currently up.
    pub fn connection_status(&self) -> bool {
        self.core.state.is_connected()
    }

    /// Failed connection attempts since the last successful connect.
    pub fn reconnect_attempts(&self) -> AttemptCount {
        self.core.state.attempts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn recording_core() -> (Arc<Core>, Arc<StdMutex<Vec<RealtimeEvent>>>) {
        let core = Arc::new(Core::default());
        let seen = Arc::new(StdMutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let seen = seen.clone();
            core.listeners
                .on(kind, move |event| seen.lock().unwrap().push(event.clone()));
        }
        (core, seen)
    }

    #[test]
    fn test_connect_and_disconnect_publish_status() {
        let (core, seen) = recording_core();

        core.handle(ProviderEvent::Connect);
        assert!(core.state.is_connected());

        core.handle(ProviderEvent::Disconnect {
            reason: "io server disconnect".into(),
        });
        assert!(!core.state.is_connected());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                RealtimeEvent::ConnectionStatus(ConnectionStatus::connected()),
                RealtimeEvent::ConnectionStatus(ConnectionStatus::disconnected(
                    "io server disconnect"
                )),
            ]
        );
    }

    #[test]
    fn test_unknown_server_events_are_ignored() {
        let (core, seen) = recording_core();

        core.handle(ProviderEvent::Message {
            name: "chat_message".into(),
            payload: json!({"text": "hi"}),
        });
        core.handle(ProviderEvent::Message {
            name: "connection_status".into(),
            payload: json!({"connected": true}),
        });

        assert!(seen.lock().unwrap().is_empty());
        assert!(!core.state.is_connected());
    }

    #[test]
    fn test_stale_sink_is_detached() {
        let (core, seen) = recording_core();
        let sink = ProviderSink {
            core: Arc::downgrade(&core),
            generation: 1,
        };

        core.generation.store(1, Ordering::SeqCst);
        assert!(sink.is_attached());

        core.generation.store(2, Ordering::SeqCst);
        assert!(!sink.is_attached());
        sink.deliver(ProviderEvent::Connect);
        assert!(seen.lock().unwrap().is_empty());

        core.generation.store(1, Ordering::SeqCst);
        drop(core);
        assert!(!sink.is_attached());
        sink.deliver(ProviderEvent::Connect);
    }
}
