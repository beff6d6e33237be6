//! Permission → token → backend registration flow.

use super::{DeviceIdentity, HttpTokenRegistry, PushProvider, TokenRegistration, TokenRegistry};
use crate::error::NotificationError;

/// Requests notification permission and registers the device's push token.
pub struct NotificationRegistrar<P, R = HttpTokenRegistry> {
    provider: P,
    registry: R,
    device: DeviceIdentity,
}

impl<P, R> NotificationRegistrar<P, R>
where
    P: PushProvider,
    R: TokenRegistry,
{
    pub fn new(provider: P, registry: R, device: DeviceIdentity) -> Self {
        Self {
            provider,
            registry,
            device,
        }
    }

    /// Request permission and, if granted, register the push token.
    ///
    /// Never fails: a denied permission ends the flow quietly and every other
    /// failure is logged. Nothing is retried.
    pub async fn request_and_register(&self) {
        let status = match self.provider.request_permission().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "Notification permission request failed");
                return;
            }
        };

        if !status.is_enabled() {
            tracing::debug!(?status, "Notification permission not granted");
            return;
        }

        tracing::info!(?status, "Notification permission enabled");

        if let Err(e) = self.register_token().await {
            tracing::error!(error = %e, "Failed to fetch or register push token");
        }
    }

    async fn register_token(&self) -> Result<(), NotificationError> {
        let token = self.provider.token().await?;
        tracing::debug!(token = %token, "Push token retrieved");

        let registration = TokenRegistration {
            token,
            device_id: self.device.device_id.clone(),
            platform: self.device.platform,
        };
        self.registry.register(&registration).await?;

        tracing::info!(
            device_id = %registration.device_id,
            platform = %registration.platform,
            "Push token registered with backend"
        );
        Ok(())
    }
}
