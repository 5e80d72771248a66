mod alerts;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod sms_client;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::alerts::repository::{PgSubscriptionRepository, SubscriptionRepository};
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::sms_client::{AfroMessageClient, SmsGateway};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job alerts API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config).await?;
    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PgSubscriptionRepository::new(db));

    // Initialize SMS gateway client
    let sms: Arc<dyn SmsGateway> = Arc::new(AfroMessageClient::new(
        config.sms_api_key.clone(),
        config.sms_sender_id.clone(),
    ));
    info!("SMS gateway client initialized (sender: {})", config.sms_sender_id);

    // Build app state
    let state = AppState {
        subscriptions,
        sms,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
