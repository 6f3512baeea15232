//! Storefront pricing service

use anyhow::Result;
use storefront_pricing::{api, config::Settings, messaging::EventPublisher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let settings = Settings::from_env()?;
    let events = EventPublisher::connect(settings.nats_url.as_deref()).await;
    let events_enabled = events.is_enabled();
    let state = api::AppState::new(settings.calculator(), events);
    let app = api::router(state);

    tracing::info!(events = events_enabled, "Storefront pricing listening on 0.0.0.0:{}", settings.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?, app).await?;
    Ok(())
}
