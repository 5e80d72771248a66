use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;

/// Connection pool for the subscriptions store.
///
/// Pool size comes from `DATABASE_MAX_CONNECTIONS`. The dispatch fan-out
/// persists one row per subscriber, so the pool size caps how much
/// per-subscriber persistence can run concurrently.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    info!(
        "Connecting to the subscriptions database (pool size {})...",
        config.database_max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    info!("Subscriptions database pool ready");
    Ok(pool)
}
