//! Error types for the QuakeWatch hub.

use thiserror::Error;

/// All possible errors from the hub.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("invalid payload for {event}: {message}")]
    InvalidPayload { event: String, message: String },
}

/// Result type for hub operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::UnknownEvent("tremor".into());
        assert_eq!(err.to_string(), "unknown event: tremor");

        let err = Error::InvalidPayload {
            event: "earthquake_update".into(),
            message: "missing field `id`".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid payload for earthquake_update: missing field `id`"
        );
    }
}
