//! Backend token registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Platform;
use crate::error::NotificationError;

/// Body of a token registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRegistration {
    /// Push token issued by the provider
    pub token: String,
    /// Stable device identifier
    pub device_id: String,
    pub platform: Platform,
}

/// Where registered tokens go.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    async fn register(&self, registration: &TokenRegistration) -> Result<(), NotificationError>;
}

/// Registers tokens with the backend over HTTP.
///
/// POSTs the registration as JSON to `{backend_url}/register-token`. Any
/// non-2xx status is an error; the response body is ignored.
#[derive(Debug, Clone)]
pub struct HttpTokenRegistry {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenRegistry {
    pub fn new(backend_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), backend_url)
    }

    pub fn with_client(client: reqwest::Client, backend_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/register-token", backend_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenRegistry for HttpTokenRegistry {
    async fn register(&self, registration: &TokenRegistration) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(registration)
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_body() {
        let registration = TokenRegistration {
            token: "tok123".into(),
            device_id: "pixel-7".into(),
            platform: Platform::Android,
        };
        assert_eq!(
            serde_json::to_value(&registration).unwrap(),
            json!({"token": "tok123", "deviceId": "pixel-7", "platform": "android"})
        );
    }

    #[test]
    fn test_endpoint_join() {
        let registry = HttpTokenRegistry::new("http://192.168.1.199:5000/");
        assert_eq!(registry.endpoint(), "http://192.168.1.199:5000/register-token");

        let registry = HttpTokenRegistry::new("https://quakes.example/api");
        assert_eq!(registry.endpoint(), "https://quakes.example/api/register-token");
    }
}
