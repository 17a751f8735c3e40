use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::config::DatabaseConfig;

pub const MAX_OPEN_CONNECTIONS: u32 = 100;
pub const WARM_CONNECTIONS: u32 = 10;
pub const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
pub const CONNECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens the Postgres pool, pings it once and applies pending migrations.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    info!(
        host = %cfg.host,
        port = cfg.port,
        user = %cfg.user,
        database = %cfg.name,
        sslmode = %cfg.sslmode,
        password = %cfg.masked_password(),
        "database settings loaded"
    );

    let options = cfg.connect_options()?;
    info!(host = %cfg.host, port = cfg.port, database = %cfg.name, "connecting to postgres");

    let pool = match PgPoolOptions::new()
        .max_connections(MAX_OPEN_CONNECTIONS)
        .min_connections(WARM_CONNECTIONS)
        .max_lifetime(CONNECTION_MAX_LIFETIME)
        .idle_timeout(CONNECTION_IDLE_TIMEOUT)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(options)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "could not connect to postgres");
            log_troubleshooting(cfg);
            return Err(e).context("connect to database");
        }
    };

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("ping database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("run database migrations")?;

    info!("database ready");
    Ok(pool)
}

fn log_troubleshooting(cfg: &DatabaseConfig) {
    error!(
        "troubleshooting: 1) the firewall/security group must allow port {port} from this host; \
         2) the instance must be reachable from this network; \
         3) check DB_USER/DB_PASSWORD; \
         4) confirm database '{name}' exists",
        port = cfg.port,
        name = cfg.name,
    );
    error!(
        "test basic connectivity with: nc -zv {} {}",
        cfg.host, cfg.port
    );
}
