//! Connection state owned by the realtime client.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::AttemptCount;

/// Connected flag plus the number of failed attempts since the last
/// successful connect.
///
/// Provider callbacks may arrive on any runtime thread, so both fields are
/// atomics. Starts out as `(false, 0)`.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
    attempts: AtomicU32,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> AttemptCount {
        self.attempts.load(Ordering::SeqCst)
    }

    /// A connection was established: connected, attempt counter cleared.
    pub fn mark_connected(&self) {
        self.attempts.store(0, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
    }

    /// The connection closed. The attempt counter is left alone.
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Record a failed connection attempt and return the new count.
    pub fn record_failed_attempt(&self) -> AttemptCount {
        self.attempts
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1)
    }
}
