//! QuakeWatch - follow live earthquake and aftershock events from a terminal.
//!
//! Registers this device for push notifications, connects to the realtime
//! server and logs every event it publishes until Ctrl-C.

use std::sync::Arc;

use quakewatch_client::{
    Config, HttpTokenRegistry, NotificationRegistrar, RealtimeClient, SocketIoTransport,
    StaticPushProvider,
};
use quakewatch_hub::{AftershockPrediction, Earthquake, EventKind, RealtimeEvent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> quakewatch_client::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quakewatch_client=debug,quakewatch_hub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        backend = %config.backend_url,
        realtime = %config.realtime_url,
        platform = %config.platform,
        "Starting QuakeWatch client"
    );

    // Push notifications
    let registrar = NotificationRegistrar::new(
        StaticPushProvider::from_token(config.push_token.clone()),
        HttpTokenRegistry::new(&config.backend_url),
        config.device(),
    );
    registrar.request_and_register().await;

    // Realtime events
    let client = RealtimeClient::new(Arc::new(SocketIoTransport::new()));
    for kind in EventKind::ALL {
        client.on(kind, log_event);
    }
    client.connect(&config.realtime_url).await;

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    client.disconnect().await;

    Ok(())
}

fn log_event(event: &RealtimeEvent) {
    match event {
        RealtimeEvent::EarthquakeUpdate(_) => match event.decode::<Earthquake>() {
            Ok(quake) => tracing::info!(
                id = %quake.id,
                magnitude = quake.magnitude,
                depth = quake.depth,
                city = quake.closest_city.as_deref().unwrap_or("unknown"),
                "New earthquake"
            ),
            Err(e) => tracing::warn!(error = %e, "Unreadable earthquake update"),
        },
        RealtimeEvent::PredictionResult(_) => match event.decode::<AftershockPrediction>() {
            Ok(prediction) if prediction.success => tracing::info!(
                id = prediction.id.as_deref().unwrap_or("unknown"),
                magnitude = ?prediction.aftershock_magnitude(),
                minutes = ?prediction.minutes_to_aftershock(),
                "Aftershock prediction"
            ),
            Ok(prediction) => tracing::warn!(
                error = prediction.error.as_deref().unwrap_or("unknown"),
                code = prediction.error_code.as_deref().unwrap_or("unknown"),
                "Aftershock prediction failed"
            ),
            Err(e) => tracing::warn!(error = %e, "Unreadable prediction result"),
        },
        RealtimeEvent::InitialEarthquakes(_) | RealtimeEvent::InitialPredictions(_) => {
            let count = event.payload().as_array().map_or(0, |items| items.len());
            tracing::info!(event = %event.kind(), count, "Received history");
        }
        other => tracing::info!(event = %other.kind(), payload = %other.payload(), "Realtime event"),
    }
}
