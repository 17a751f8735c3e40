use anyhow::Context;

use aquiestoy::{app, config::AppConfig, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "aquiestoy=debug,axum=info,tower_http=info,sqlx=warn".to_string());
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

    let config = AppConfig::from_env().context("load configuration")?;
    if config.jwt.using_default_secret {
        tracing::warn!("running with the default JWT secret; set JWT_SECRET before deploying");
    }

    let pool = db::connect(&config.database).await?;
    let state = AppState::from_config(&config, pool);

    let app = app::build_app(state);
    app::serve(app, &config.host, config.port).await
}
