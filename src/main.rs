mod app;
mod beneficiaries;
mod clock;
mod config;
mod error;
mod export;
mod extract;
mod meals;
mod state;

use anyhow::Context;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "b2_registry=debug,axum=info,tower_http=info".to_string());
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

    let app_state = AppState::init().await?;
    tracing::info!(
        offset = %app_state.config.utc_offset,
        "registry configured"
    );

    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run database migrations")?;

    app::serve(app_state).await
}
