//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use madziarynka_backoffice::config::{BackofficeConfig, ConfigError};
use madziarynka_backoffice::db;
use sqlx::PgPool;

/// Errors shared by every command that needs a database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using the same environment variables as the server.
///
/// # Errors
///
/// Returns `ConnectError` if `DATABASE_URL` is missing or unreachable.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let config = BackofficeConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    Ok(pool)
}
