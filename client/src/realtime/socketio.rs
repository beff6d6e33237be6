//! Socket.IO transport backed by `rust_socketio`.
//!
//! Reconnection, heartbeats and the Engine.IO handshake are all handled by
//! the library. This adapter maps the options onto its builder and forwards
//! its callbacks into a [`ProviderSink`].
//!
//! The library only raises `close` when the server sends a disconnect packet.
//! A dropped network shows up as the start of its reconnect loop instead, so
//! the adapter tracks whether a session is live and reads each
//! `on_reconnect` call as either the end of that session or the failure of
//! the previous attempt.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use quakewatch_hub::EventKind;
use rust_socketio::asynchronous::{Client, ClientBuilder, ReconnectSettings};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::Value;

use super::{ProviderEvent, ProviderSink, Transport, TransportHandle, TransportOptions};
use crate::error::TransportError;

/// Prefix the library puts on a server `CONNECT_ERROR` packet.
const CONNECT_ERROR_FRAME: &str = "Received an ConnectError frame: ";

/// Reason reported when the socket goes away without a disconnect packet.
const TRANSPORT_CLOSE: &str = "transport close";

/// Opens Socket.IO connections.
#[derive(Debug, Clone, Default)]
pub struct SocketIoTransport;

impl SocketIoTransport {
    pub fn new() -> Self {
        Self
    }

    fn builder(url: &str, options: &TransportOptions, session: &Arc<Session>) -> ClientBuilder {
        let delay_ms = u64::try_from(options.reconnect_delay.as_millis()).unwrap_or(u64::MAX);

        let reconnecting = session.clone();
        let mut builder = ClientBuilder::new(url)
            .reconnect(options.reconnection)
            .reconnect_delay(delay_ms, delay_ms)
            .max_reconnect_attempts(options.max_reconnect_attempts)
            .on(Event::Connect, forward(session, |session, _| session.opened()))
            .on(
                Event::Close,
                forward(session, |session, payload| session.closed(close_reason(&payload))),
            )
            .on(Event::Error, forward(session, |session, payload| session.error(payload)))
            .on_reconnect(move || {
                reconnecting.reconnecting();
                async { ReconnectSettings::new() }.boxed()
            });

        if options.websocket_only {
            builder = builder.transport_type(TransportType::Websocket);
        }

        for kind in EventKind::DATA {
            builder = builder.on(
                kind.as_str(),
                forward(session, move |session, payload| {
                    session.sink.deliver(ProviderEvent::Message {
                        name: kind.as_str().to_string(),
                        payload,
                    })
                }),
            );
        }

        builder
    }

    async fn connect_once(
        url: &str,
        options: &TransportOptions,
        session: &Arc<Session>,
    ) -> Result<Client, TransportError> {
        let builder = Self::builder(url, options, session);
        match tokio::time::timeout(options.connect_timeout, builder.connect()).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(e)) => Err(TransportError::Connect(e.to_string())),
            Err(_) => Err(TransportError::Timeout(options.connect_timeout)),
        }
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    /// Open a connection, retrying a failed first attempt like the library
    /// retries a dropped one.
    ///
    /// Every failure but the last is reported through `sink`; the last one is
    /// returned. Retries stop as soon as the sink is detached.
    async fn open(
        &self,
        url: &str,
        options: &TransportOptions,
        sink: ProviderSink,
    ) -> Result<Arc<dyn TransportHandle>, TransportError> {
        reqwest::Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;

        let session = Arc::new(Session::new(sink, options));
        let mut retries: u8 = 0;

        let client = loop {
            let error = match Self::connect_once(url, options, &session).await {
                Ok(client) => break client,
                Err(e) => e,
            };

            let retry = options.reconnection
                && retries < options.max_reconnect_attempts
                && session.sink.is_attached();
            if !retry {
                return Err(error);
            }

            retries += 1;
            tracing::debug!(error = %error, retries, "Realtime connect failed, retrying");
            session.sink.deliver(ProviderEvent::ConnectError {
                error: error.to_string(),
            });
            tokio::time::sleep(options.reconnect_delay).await;
        };

        let handle: Arc<dyn TransportHandle> = Arc::new(SocketIoHandle { client });
        Ok(handle)
    }
}

/// What the adapter knows about one logical connection.
#[derive(Debug)]
struct Session {
    sink: ProviderSink,
    live: AtomicBool,
    /// `on_reconnect` calls since the session was last live.
    reconnects: AtomicU8,
    max_reconnects: u8,
    attempt_timeout: Duration,
}

impl Session {
    fn new(sink: ProviderSink, options: &TransportOptions) -> Self {
        Self {
            sink,
            live: AtomicBool::new(false),
            reconnects: AtomicU8::new(0),
            max_reconnects: options.max_reconnect_attempts,
            attempt_timeout: options.connect_timeout,
        }
    }

    fn opened(&self) {
        self.live.store(true, Ordering::SeqCst);
        self.reconnects.store(0, Ordering::SeqCst);
        self.sink.deliver(ProviderEvent::Connect);
    }

    fn closed(&self, reason: String) {
        self.live.store(false, Ordering::SeqCst);
        self.sink.deliver(ProviderEvent::Disconnect { reason });
    }

    fn error(&self, payload: Value) {
        match connect_error_frame(&payload) {
            Some(error) => self.sink.deliver(ProviderEvent::ConnectError { error }),
            None => self.sink.deliver(ProviderEvent::Error(payload)),
        }
    }

    /// The library is about to try reconnecting.
    fn reconnecting(self: &Arc<Self>) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.sink.deliver(ProviderEvent::Disconnect {
                reason: TRANSPORT_CLOSE.to_string(),
            });
        } else {
            self.sink.deliver(ProviderEvent::ConnectError {
                error: "reconnect attempt failed".to_string(),
            });
        }

        let calls = self.reconnects.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if calls < self.max_reconnects {
            return;
        }

        // No further call will report the last attempt; check on it ourselves
        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.attempt_timeout).await;
            if !session.live.load(Ordering::SeqCst) && session.sink.is_attached() {
                session.sink.deliver(ProviderEvent::ConnectError {
                    error: "reconnection failed".to_string(),
                });
            }
        });
    }
}

/// An open Socket.IO connection.
struct SocketIoHandle {
    client: Client,
}

#[async_trait]
impl TransportHandle for SocketIoHandle {
    async fn emit(&self, event: &str, data: Value) -> Result<(), TransportError> {
        self.client
            .emit(event.to_string(), data)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}

/// Build a Socket.IO callback that hands its payload to `session`.
fn forward<F>(
    session: &Arc<Session>,
    map: F,
) -> impl FnMut(Payload, Client) -> BoxFuture<'static, ()> + Send + Sync + 'static
where
    F: Fn(&Session, Value) + Send + Sync + 'static,
{
    let session = session.clone();
    move |payload: Payload, _socket: Client| {
        map(&session, payload_value(payload));
        async {}.boxed()
    }
}

/// Flatten a Socket.IO payload into a single JSON value.
///
/// Events with one argument yield that argument; several arguments become an
/// array. Binary payloads become an array of bytes.
#[allow(deprecated)]
fn payload_value(payload: Payload) -> Value {
    match payload {
        Payload::Text(mut values) => {
            if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            }
        }
        Payload::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Payload::Binary(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

fn close_reason(payload: &Value) -> String {
    match payload {
        Value::String(reason) if !reason.is_empty() => reason.clone(),
        _ => TRANSPORT_CLOSE.to_string(),
    }
}

/// The server's message, when `payload` reports a rejected connect.
fn connect_error_frame(payload: &Value) -> Option<String> {
    let message = payload.as_str()?.strip_prefix(CONNECT_ERROR_FRAME)?;
    let error = match serde_json::from_str::<Value>(message) {
        Ok(Value::String(text)) => text,
        Ok(Value::Object(fields)) => match fields.get("message").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => Value::Object(fields).to_string(),
        },
        _ => message.to_string(),
    };
    Some(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_argument_payload_is_unwrapped() {
        let value = payload_value(Payload::Text(vec![json!({"id": 1, "mag": 4.5})]));
        assert_eq!(value, json!({"id": 1, "mag": 4.5}));
    }

    #[test]
    fn test_multi_argument_payload_becomes_array() {
        let value = payload_value(Payload::Text(vec![json!(1), json!("two")]));
        assert_eq!(value, json!([1, "two"]));

        let value = payload_value(Payload::Text(vec![]));
        assert_eq!(value, json!([]));
    }

    #[test]
    fn test_binary_payload() {
        let value = payload_value(Payload::Binary(vec![1u8, 2, 3].into()));
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_close_reason() {
        assert_eq!(close_reason(&json!("io server disconnect")), "io server disconnect");
        assert_eq!(close_reason(&json!("")), "transport close");
        assert_eq!(close_reason(&Value::Null), "transport close");
    }

    #[test]
    fn test_connect_error_frame() {
        let frame = |data: &str| json!(format!("{CONNECT_ERROR_FRAME}{data}"));

        assert_eq!(
            connect_error_frame(&frame(r#"{"message":"unauthorized"}"#)).as_deref(),
            Some("unauthorized")
        );
        assert_eq!(
            connect_error_frame(&frame(r#""No error message provided""#)).as_deref(),
            Some("No error message provided")
        );
        assert_eq!(connect_error_frame(&json!("Invalid packet")), None);
        assert_eq!(connect_error_frame(&json!({"message": "nope"})), None);
    }

    fn recording_client() -> (crate::RealtimeClient, Arc<std::sync::Mutex<Vec<Value>>>) {
        let client = crate::RealtimeClient::new(Arc::new(SocketIoTransport::new()));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let kinds = [
            EventKind::ConnectionStatus,
            EventKind::ConnectionError,
            EventKind::SocketError,
        ];
        for kind in kinds {
            let seen = seen.clone();
            client.on(kind, move |event| {
                let entry = json!({"event": kind.as_str(), "data": event.payload()});
                seen.lock().unwrap().push(entry);
            });
        }
        (client, seen)
    }

    #[tokio::test]
    async fn test_session_reports_drop_and_failed_reconnects() {
        let (client, seen) = recording_client();
        let options = TransportOptions {
            max_reconnect_attempts: 2,
            connect_timeout: Duration::from_millis(20),
            ..TransportOptions::default()
        };
        let session = Arc::new(Session::new(client.attached_sink(), &options));

        session.opened();
        assert!(client.connection_status());

        // Network gone: first call ends the session, later ones mean failures
        session.reconnecting();
        assert!(!client.connection_status());
        session.reconnecting();
        assert_eq!(client.reconnect_attempts(), 1);

        // The last attempt is reported once it had time to complete
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(client.reconnect_attempts(), 2);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                json!({"event": "connection_status", "data": {"connected": true}}),
                json!({"event": "connection_status",
                       "data": {"connected": false, "reason": "transport close"}}),
                json!({"event": "connection_error",
                       "data": {"error": "reconnect attempt failed", "attempts": 1}}),
                json!({"event": "connection_error",
                       "data": {"error": "reconnection failed", "attempts": 2}}),
            ]
        );
    }

    #[tokio::test]
    async fn test_session_recovers_after_reconnect() {
        let (client, _seen) = recording_client();
        let options = TransportOptions {
            max_reconnect_attempts: 1,
            connect_timeout: Duration::from_millis(20),
            ..TransportOptions::default()
        };
        let session = Arc::new(Session::new(client.attached_sink(), &options));

        session.opened();
        session.reconnecting();
        session.opened();
        assert!(client.connection_status());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[test]
    fn test_session_error_payloads() {
        let (client, seen) = recording_client();
        let session = Session::new(client.attached_sink(), &TransportOptions::default());

        let rejected = format!(r#"{CONNECT_ERROR_FRAME}{{"message":"bad token"}}"#);
        session.error(json!(rejected));
        session.error(json!("Invalid packet"));

        assert_eq!(client.reconnect_attempts(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                json!({"event": "connection_error", "data": {"error": "bad token", "attempts": 1}}),
                json!({"event": "socket_error", "data": "Invalid packet"}),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_connecting() {
        let client = crate::RealtimeClient::new(Arc::new(SocketIoTransport::new()));
        let failures = Arc::new(std::sync::Mutex::new(Vec::new()));

        let sink = failures.clone();
        client.on(EventKind::ConnectionError, move |event| {
            sink.lock().unwrap().push(event.payload());
        });

        client.connect("not a url").await;

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].get("attempts").is_none());
        assert!(!client.connection_status());
    }
}
