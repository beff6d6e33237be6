//! Push notification registration.
//!
//! Asks the platform's push provider for permission, fetches the device token
//! and reports it to the backend. Every failure is logged and swallowed: the
//! caller only ever sees `()`.

mod provider;
mod registrar;
mod registry;

pub use provider::*;
pub use registrar::NotificationRegistrar;
pub use registry::*;
