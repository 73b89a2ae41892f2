mod app;
mod auth;
mod config;
mod db;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "credgate=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if let Err(e) = config.require_database_url() {
        tracing::error!(error = %e, "refusing to start");
        return Err(e);
    }
    tracing::info!("DATABASE_URL is set");

    let state = AppState::init(config.clone()).await;
    let app = app::build_app(state);
    app::serve(app, &config).await
}
