use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::{
    jwt::TokenService,
    password::PasswordHasher,
    repo::{PgUserStore, UserStore},
    repo_memory::MemoryUserStore,
    services::AuthService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, secret: &[u8]) -> Self {
        let auth = AuthService::new(users, PasswordHasher::new(), TokenService::new(secret));
        Self {
            auth: Arc::new(auth),
        }
    }

    pub fn from_config(config: &AppConfig, db: PgPool) -> Self {
        Self::new(Arc::new(PgUserStore::new(db)), config.jwt.secret.as_bytes())
    }

    /// Database-less state backed by [`MemoryUserStore`].
    pub fn in_memory(secret: &[u8]) -> Self {
        Self::new(Arc::new(MemoryUserStore::new()), secret)
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.tokens().clone()
    }
}
