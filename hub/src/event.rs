//! Published event definitions.
//!
//! The event set is fixed: three connection events produced by the client
//! itself and four data events relayed from the server. Data payloads are
//! opaque JSON and reach subscribers exactly as the transport delivered them.

use crate::error::{Error, Result};
use crate::AttemptCount;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Name of a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConnectionStatus,
    ConnectionError,
    SocketError,
    InitialEarthquakes,
    InitialPredictions,
    EarthquakeUpdate,
    PredictionResult,
}

impl EventKind {
    /// Every published event kind.
    pub const ALL: [EventKind; 7] = [
        EventKind::ConnectionStatus,
        EventKind::ConnectionError,
        EventKind::SocketError,
        EventKind::InitialEarthquakes,
        EventKind::InitialPredictions,
        EventKind::EarthquakeUpdate,
        EventKind::PredictionResult,
    ];

    /// Server data events, relayed under their own name.
    pub const DATA: [EventKind; 4] = [
        EventKind::InitialEarthquakes,
        EventKind::InitialPredictions,
        EventKind::EarthquakeUpdate,
        EventKind::PredictionResult,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConnectionStatus => "connection_status",
            EventKind::ConnectionError => "connection_error",
            EventKind::SocketError => "socket_error",
            EventKind::InitialEarthquakes => "initial_earthquakes",
            EventKind::InitialPredictions => "initial_predictions",
            EventKind::EarthquakeUpdate => "earthquake_update",
            EventKind::PredictionResult => "prediction_result",
        }
    }

    /// Whether this kind is relayed from the server unchanged.
    pub fn is_data(&self) -> bool {
        Self::DATA.contains(self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownEvent(s.to_string()))
    }
}

/// Payload of a `connection_status` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    /// Why the connection closed (only set on disconnect)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConnectionStatus {
    pub fn connected() -> Self {
        Self {
            connected: true,
            reason: None,
        }
    }

    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            connected: false,
            reason: Some(reason.into()),
        }
    }
}

/// Payload of a `connection_error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionFailure {
    pub error: String,
    /// Failed attempts since the last successful connect. Absent when the
    /// connection could not even be set up (for example a malformed URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<AttemptCount>,
}

/// An event delivered to local subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    ConnectionStatus(ConnectionStatus),
    ConnectionError(ConnectionFailure),
    SocketError(Value),
    InitialEarthquakes(Value),
    InitialPredictions(Value),
    EarthquakeUpdate(Value),
    PredictionResult(Value),
}

impl RealtimeEvent {
    /// Build a data event from a server event name.
    ///
    /// Returns `None` for names outside the data event set.
    pub fn from_data(name: &str, payload: Value) -> Option<Self> {
        let kind = EventKind::from_str(name).ok()?;
        match kind {
            EventKind::InitialEarthquakes => Some(RealtimeEvent::InitialEarthquakes(payload)),
            EventKind::InitialPredictions => Some(RealtimeEvent::InitialPredictions(payload)),
            EventKind::EarthquakeUpdate => Some(RealtimeEvent::EarthquakeUpdate(payload)),
            EventKind::PredictionResult => Some(RealtimeEvent::PredictionResult(payload)),
            EventKind::ConnectionStatus | EventKind::ConnectionError | EventKind::SocketError => {
                None
            }
        }
    }

    /// The kind this event is published under.
    pub fn kind(&self) -> EventKind {
        match self {
            RealtimeEvent::ConnectionStatus(_) => EventKind::ConnectionStatus,
            RealtimeEvent::ConnectionError(_) => EventKind::ConnectionError,
            RealtimeEvent::SocketError(_) => EventKind::SocketError,
            RealtimeEvent::InitialEarthquakes(_) => EventKind::InitialEarthquakes,
            RealtimeEvent::InitialPredictions(_) => EventKind::InitialPredictions,
            RealtimeEvent::EarthquakeUpdate(_) => EventKind::EarthquakeUpdate,
            RealtimeEvent::PredictionResult(_) => EventKind::PredictionResult,
        }
    }

    /// The event payload as JSON, in the shape subscribers receive it.
    pub fn payload(&self) -> Value {
        match self {
            RealtimeEvent::ConnectionStatus(status) => {
                serde_json::to_value(status).unwrap_or(Value::Null)
            }
            RealtimeEvent::ConnectionError(failure) => {
                serde_json::to_value(failure).unwrap_or(Value::Null)
            }
            RealtimeEvent::SocketError(value)
            | RealtimeEvent::InitialEarthquakes(value)
            | RealtimeEvent::InitialPredictions(value)
            | RealtimeEvent::EarthquakeUpdate(value)
            | RealtimeEvent::PredictionResult(value) => value.clone(),
        }
    }

    /// Decode the payload into a typed view, e.g. [`crate::Earthquake`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload()).map_err(|e| Error::InvalidPayload {
            event: self.kind().to_string(),
            message: e.to_string(),
        })
    }
}
