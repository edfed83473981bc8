use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Open the Postgres connection pool. Statement logging stays off;
/// request-level logging is tower-http's job.
pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.as_str());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .map_err(|e| AppError::Internal(format!("Database connection failed: {e}")))?;

    tracing::debug!("database pool ready");
    Ok(db)
}
