use std::sync::Arc;

use tracing::warn;

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::db::ConnectionProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    /// Builds the Postgres-backed state and makes one warm-up connection
    /// attempt. A failed warm-up is not fatal; the first request retries.
    pub async fn init(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let provider = Arc::new(ConnectionProvider::new(&config));

        if let Err(e) = provider.acquire().await {
            warn!(error = %e, "initial database connection failed; will retry on demand");
        }

        let users = Arc::new(PgUserStore::new(provider)) as Arc<dyn UserStore>;
        Self { config, users }
    }

    #[cfg(test)]
    pub fn fake(config: AppConfig, users: Arc<dyn UserStore>) -> Self {
        Self {
            config: Arc::new(config),
            users,
        }
    }
}
