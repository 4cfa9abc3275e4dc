use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config::PostgresConfig;
use crate::store::error::StoreError;

/// Build the shared Postgres pool from explicit configuration.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await?;

    info!("Connected to Postgres ({} max connections)", config.max_connections);
    Ok(pool)
}

/// Ping the relational store; used by the health endpoint.
pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
