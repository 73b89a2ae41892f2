use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Store connection string. `None` is a fatal configuration error.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub store_timeout: Duration,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let port = std::env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()?;
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            store_timeout: Duration::from_secs(
                std::env::var("STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(5),
            ),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        })
    }

    /// Fails when the connection string is absent.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "DATABASE_URL is not set; define it in the environment or .env and restart the server"
            )
        })
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests(database_url: Option<&str>) -> Self {
        Self {
            database_url: database_url.map(Into::into),
            host: "127.0.0.1".into(),
            port: 0,
            store_timeout: Duration::from_secs(1),
            max_connections: 1,
        }
    }
}
