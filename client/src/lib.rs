//! QuakeWatch Client - realtime earthquake events and push token registration.
//!
//! Two independent pieces a mobile front end builds on:
//!
//! - [`RealtimeClient`] connects to the QuakeWatch Socket.IO server and
//!   republishes its events (earthquakes, aftershock predictions, connection
//!   changes) to local subscribers.
//! - [`NotificationRegistrar`] asks for notification permission and reports
//!   the device's push token to the backend.
//!
//! Both are explicit instances built by the application's composition root;
//! see `main.rs` for the wiring.

pub mod config;
pub mod error;
pub mod notifications;
pub mod realtime;

pub use config::{Config, ConfigError};
pub use error::{Error, NotificationError, Result, TransportError};
pub use notifications::{
    AuthorizationStatus, DeviceIdentity, HttpTokenRegistry, NotificationRegistrar, Platform,
    PushProvider, StaticPushProvider, TokenRegistration, TokenRegistry,
};
pub use quakewatch_hub::{EventKind, Handler, RealtimeEvent};
pub use realtime::{
    ProviderEvent, ProviderSink, RealtimeClient, SocketIoTransport, Transport, TransportHandle,
    TransportOptions, CLIENT_DISCONNECT,
};
