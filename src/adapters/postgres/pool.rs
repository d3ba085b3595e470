//! Connection pool setup and migrations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::ports::StorageError;

/// Connects to PostgreSQL and applies pending migrations.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| StorageError::database(format!("Failed to connect: {}", e)))?;

    tracing::info!(max_connections, "database connection established");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to run migrations: {}", e)))?;

    tracing::debug!("database migrations completed");
    Ok(pool)
}
