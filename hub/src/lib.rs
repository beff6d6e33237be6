//! # QuakeWatch Hub
//!
//! The IO-free core of the QuakeWatch realtime client.
//!
//! This crate owns everything that happens between "the transport delivered
//! something" and "a UI callback ran": the fixed set of published events, the
//! listener registry that fans them out, and the connection state the client
//! reports. It knows nothing about sockets, HTTP or async runtimes.
//!
//! ## Core Concepts
//!
//! ### Events
//!
//! Every published event is a [`RealtimeEvent`], a tagged union keyed by
//! [`EventKind`]:
//! - [`EventKind::ConnectionStatus`] - connected / disconnected (with reason)
//! - [`EventKind::ConnectionError`] - failed connection attempt
//! - [`EventKind::SocketError`] - transport-level error
//! - [`EventKind::InitialEarthquakes`], [`EventKind::InitialPredictions`],
//!   [`EventKind::EarthquakeUpdate`], [`EventKind::PredictionResult`] -
//!   server data, passed through as opaque JSON
//!
//! ### Listener Registry
//!
//! The [`ListenerRegistry`] maps each kind to an ordered list of handlers.
//! Handlers run in registration order; a handler that panics is logged and
//! skipped so the rest still receive the event.
//!
//! ### Connection State
//!
//! [`ConnectionState`] tracks the connected flag and the number of failed
//! connection attempts since the last successful connect.
//!
//! ## Quick Start
//!
//! ```rust
//! use quakewatch_hub::{EventKind, ListenerRegistry, RealtimeEvent};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let registry = ListenerRegistry::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = seen.clone();
//! let handler = registry.on(EventKind::EarthquakeUpdate, move |event| {
//!     assert_eq!(event.payload()["mag"], 4.5);
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! registry.emit(&RealtimeEvent::EarthquakeUpdate(json!({"id": 1, "mag": 4.5})));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! registry.off(EventKind::EarthquakeUpdate, &handler);
//! registry.emit(&RealtimeEvent::EarthquakeUpdate(json!({"id": 2, "mag": 3.1})));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

pub mod error;
pub mod event;
pub mod models;
pub mod registry;
pub mod state;

// Re-export main types at crate root
pub use error::Error;
pub use event::{ConnectionFailure, ConnectionStatus, EventKind, RealtimeEvent};
pub use models::{AftershockPrediction, Airport, Earthquake, PredictionValues};
pub use registry::{Handler, ListenerRegistry};
pub use state::ConnectionState;

/// Number of failed connection attempts since the last successful connect.
pub type AttemptCount = u32;
