//! Configuration management for the client.

use std::env;

use crate::notifications::{DeviceIdentity, Platform};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the QuakeWatch backend
    pub backend_url: String,
    /// Socket.IO server URL (defaults to the backend URL)
    pub realtime_url: String,
    /// Stable identifier reported with the push token
    pub device_id: String,
    /// Platform reported with the push token
    pub platform: Platform,
    /// Token served by the static push provider
    pub push_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend_url = var("BACKEND_URL").ok_or(ConfigError::MissingBackendUrl)?;
        validate_url("BACKEND_URL", &backend_url)?;

        let realtime_url = match var("REALTIME_URL") {
            Some(url) => {
                validate_url("REALTIME_URL", &url)?;
                url
            }
            None => backend_url.clone(),
        };

        let device_id = var("DEVICE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let platform = match var("PLATFORM") {
            Some(value) => value
                .parse::<Platform>()
                .map_err(|_| ConfigError::InvalidPlatform(value))?,
            None => Platform::current(),
        };

        let push_token = var("PUSH_TOKEN");

        Ok(Self {
            backend_url,
            realtime_url,
            device_id,
            platform,
            push_token,
        })
    }

    /// Identity reported alongside the push token.
    pub fn device(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.device_id.clone(), self.platform)
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidUrl(name))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BACKEND_URL environment variable is required")]
    MissingBackendUrl,

    #[error("Invalid URL in {0}")]
    InvalidUrl(&'static str),

    #[error("Invalid PLATFORM value: {0}")]
    InvalidPlatform(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_backend_url_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackendUrl));

        let err = Config::from_lookup(lookup(&[("BACKEND_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackendUrl));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("BACKEND_URL", "http://10.0.2.2:5000")])).unwrap();

        assert_eq!(config.realtime_url, "http://10.0.2.2:5000");
        assert_eq!(config.platform, Platform::current());
        assert!(uuid::Uuid::parse_str(&config.device_id).is_ok());
        assert!(config.push_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BACKEND_URL", "http://10.0.2.2:5000"),
            ("REALTIME_URL", "ws://10.0.2.2:5000"),
            ("DEVICE_ID", "pixel-7"),
            ("PLATFORM", "android"),
            ("PUSH_TOKEN", "tok123"),
        ]))
        .unwrap();

        assert_eq!(config.realtime_url, "ws://10.0.2.2:5000");
        assert_eq!(config.device_id, "pixel-7");
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.push_token.as_deref(), Some("tok123"));

        let device = config.device();
        assert_eq!(device.device_id, "pixel-7");
        assert_eq!(device.platform, Platform::Android);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("BACKEND_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl("BACKEND_URL")));

        let err = Config::from_lookup(lookup(&[
            ("BACKEND_URL", "http://10.0.2.2:5000"),
            ("PLATFORM", "symbian"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlatform(ref p) if p == "symbian"));
    }
}
