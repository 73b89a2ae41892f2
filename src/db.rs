use std::{str::FromStr, time::Duration};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};
use url::Url;

use crate::config::AppConfig;

/// Database used when the connection string carries no path segment.
pub const DEFAULT_DATABASE: &str = "Cluster0";

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
    #[error("invalid connection string: {0}")]
    InvalidUrl(String),
    #[error("timed out connecting to the database after {0:?}")]
    Timeout(Duration),
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Established handle: the pool plus the logical database it points at.
#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
    pub name: String,
}

/// Lazily connects on first `acquire` and keeps the handle for the life of the
/// process. Concurrent first callers wait on the same initialization; a failed
/// attempt leaves nothing cached so the next caller starts over.
pub struct ConnectionProvider {
    database_url: Option<String>,
    timeout: Duration,
    max_connections: u32,
    cached: OnceCell<Database>,
}

impl ConnectionProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            database_url: config.database_url.clone(),
            timeout: config.store_timeout,
            max_connections: config.max_connections,
            cached: OnceCell::new(),
        }
    }

    pub async fn acquire(&self) -> Result<&Database, ConnectError> {
        self.cached.get_or_try_init(|| self.connect()).await
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.cached.initialized()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn connect(&self) -> Result<Database, ConnectError> {
        let url = self.database_url.as_deref().ok_or(ConnectError::MissingUrl)?;
        let name = database_name(url)?;
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| ConnectError::InvalidUrl(e.to_string()))?
            .database(&name);

        let connecting = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.timeout)
            .connect_with(options);
        let pool = match tokio::time::timeout(self.timeout, connecting).await {
            Ok(Ok(pool)) => pool,
            // sqlx keeps retrying until its own acquire deadline
            Ok(Err(sqlx::Error::PoolTimedOut)) | Err(_) => {
                error!(database = %name, timeout = ?self.timeout, "database connect timed out");
                return Err(ConnectError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                error!(error = %e, database = %name, "failed to connect to database");
                return Err(ConnectError::Connect(e));
            }
        };

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            error!(
                error = %e,
                "migration failed; the unique email index may be missing, duplicate checks fall back to the pre-insert lookup"
            );
        }

        info!(database = %name, "database connected");
        Ok(Database { pool, name })
    }
}

/// Logical database name from the URL path, or [`DEFAULT_DATABASE`].
pub fn database_name(url: &str) -> Result<String, ConnectError> {
    let parsed = Url::parse(url).map_err(|e| ConnectError::InvalidUrl(e.to_string()))?;
    let name = parsed.path().trim_start_matches('/');
    if name.is_empty() {
        Ok(DEFAULT_DATABASE.to_string())
    } else {
        Ok(name.to_string())
    }
}
