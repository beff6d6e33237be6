//! Listener registry.
//!
//! Maps each [`EventKind`] to an ordered list of handlers. Emission works on a
//! snapshot of the list, so handlers may subscribe or unsubscribe from inside
//! a callback without deadlocking the registry.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;

use crate::event::{EventKind, RealtimeEvent};

/// A subscriber callback.
///
/// Handlers are compared by identity: keep the `Handler` returned by
/// [`ListenerRegistry::on`] to remove it later.
pub type Handler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

/// Thread-safe registry of event subscribers.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<EventKind, Vec<Handler>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Subscribe a closure to `kind`.
    ///
    /// Returns the handler so it can be passed to [`ListenerRegistry::off`].
    pub fn on<F>(&self, kind: EventKind, callback: F) -> Handler
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(callback);
        self.add(kind, handler.clone());
        handler
    }

    /// Append an existing handler to `kind`. The same handler may be added
    /// more than once and will then run once per registration.
    pub fn add(&self, kind: EventKind, handler: Handler) {
        self.listeners.entry(kind).or_default().push(handler);
    }

    /// Remove the first registration of `handler` from `kind`.
    ///
    /// Returns `false` if it was not registered.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> bool {
        let Some(mut handlers) = self.listeners.get_mut(&kind) else {
            return false;
        };

        match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every handler subscribed to its kind, in
    /// registration order.
    ///
    /// A handler that panics is logged and skipped. Returns the number of
    /// handlers that completed.
    pub fn emit(&self, event: &RealtimeEvent) -> usize {
        let kind = event.kind();
        let snapshot: Vec<Handler> = match self.listeners.get(&kind) {
            Some(handlers) => handlers.value().clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for handler in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    tracing::error!(
                        event = %kind,
                        error = %panic_message(cause.as_ref()),
                        "Event listener failed"
                    );
                }
            }
        }

        delivered
    }

    /// Number of registrations for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, |handlers| handlers.len())
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for entry in self.listeners.iter() {
            map.entry(entry.key(), &entry.value().len());
        }
        map.finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}
