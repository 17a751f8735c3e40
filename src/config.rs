use std::fmt;
use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;
use tracing::info;

/// Signing secret used when `JWT_SECRET` is not set outside production.
pub const DEFAULT_JWT_SECRET: &str = "default-secret-change-in-production";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_SSLMODE: &str = "require";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be set when APP_ENV=production")]
    SecretRequiredInProduction,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let ssl_mode = PgSslMode::from_str(&self.sslmode).map_err(|_| ConfigError::Invalid {
            name: "DB_SSLMODE",
            value: self.sslmode.clone(),
        })?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode)
            .options([("timezone", "UTC")]))
    }

    /// Password reduced to its first character, for logs.
    pub fn masked_password(&self) -> String {
        match self.password.chars().next() {
            Some(c) => format!("{c}***"),
            None => "(empty)".into(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.masked_password())
            .field("name", &self.name)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub using_default_secret: bool,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("using_default_secret", &self.using_default_secret)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let host = required("DB_HOST")?;
        let user = required("DB_USER")?;
        let password = required("DB_PASSWORD")?;
        let name = required("DB_NAME")?;

        let port = match var("DB_PORT") {
            Some(raw) => parse_port("DB_PORT", raw)?,
            None => {
                info!(port = DEFAULT_DB_PORT, "DB_PORT not set, using default");
                DEFAULT_DB_PORT
            }
        };
        let sslmode = var("DB_SSLMODE").unwrap_or_else(|| {
            info!(sslmode = DEFAULT_DB_SSLMODE, "DB_SSLMODE not set, using default");
            DEFAULT_DB_SSLMODE.into()
        });

        let production = var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let jwt = match var("JWT_SECRET") {
            Some(secret) => JwtConfig {
                secret,
                using_default_secret: false,
            },
            None if production => return Err(ConfigError::SecretRequiredInProduction),
            None => JwtConfig {
                secret: DEFAULT_JWT_SECRET.into(),
                using_default_secret: true,
            },
        };

        let database = DatabaseConfig {
            host,
            port,
            user,
            password,
            name,
            sslmode,
        };
        // Fail on a bad sslmode here rather than at connect time.
        database.connect_options()?;

        Ok(Self {
            database,
            jwt,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match var("APP_PORT") {
                Some(raw) => parse_port("APP_PORT", raw)?,
                None => 8080,
            },
        })
    }
}

fn parse_port(name: &'static str, raw: String) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}
