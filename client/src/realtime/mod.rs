//! Realtime event client.
//!
//! Wraps a Socket.IO connection to the QuakeWatch server and republishes its
//! events through the hub's listener registry. The transport owns socket IO
//! and reconnection; this module only reacts to what it reports.

mod client;
mod socketio;
mod transport;

pub use client::{ProviderSink, RealtimeClient, CLIENT_DISCONNECT};
pub use socketio::SocketIoTransport;
pub use transport::*;
