//! Push provider seam and device identity.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// Outcome of a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
}

impl AuthorizationStatus {
    /// Whether the app may receive notifications.
    pub fn is_enabled(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional
        )
    }
}

/// A platform push notification provider.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Ask the user for notification permission. May show an OS prompt.
    async fn request_permission(&self) -> Result<AuthorizationStatus, NotificationError>;

    /// Current push token for this device.
    async fn token(&self) -> Result<String, NotificationError>;
}

/// A provider with a fixed permission result and token.
///
/// Used on hosts without a platform push service.
#[derive(Debug, Clone)]
pub struct StaticPushProvider {
    status: AuthorizationStatus,
    token: Option<String>,
}

impl StaticPushProvider {
    pub fn new(status: AuthorizationStatus, token: Option<String>) -> Self {
        Self { status, token }
    }

    /// Authorized when a token is available, undetermined otherwise.
    pub fn from_token(token: Option<String>) -> Self {
        let status = if token.is_some() {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::NotDetermined
        };
        Self { status, token }
    }
}

#[async_trait]
impl PushProvider for StaticPushProvider {
    async fn request_permission(&self) -> Result<AuthorizationStatus, NotificationError> {
        Ok(self.status)
    }

    async fn token(&self) -> Result<String, NotificationError> {
        self.token
            .clone()
            .ok_or_else(|| NotificationError::Token("no push token configured".to_string()))
    }
}

/// Operating system reported with the push token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Macos,
    Windows,
    Linux,
    Web,
}

impl Platform {
    /// Platform of the compile target.
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "macos" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// The device a push token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub platform: Platform,
}

impl DeviceIdentity {
    pub fn new(device_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            device_id: device_id.into(),
            platform,
        }
    }
}
