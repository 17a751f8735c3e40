use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{
    dto::UserResponse,
    jwt::{TokenError, TokenService},
    password::{PasswordError, PasswordHasher},
    repo::{StoreError, UserStore},
    repo_types::NewUser,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already registered")]
    EmailAlreadyRegistered,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    #[error("password task failed: {0}")]
    Blocking(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::EmailAlreadyRegistered,
            other => AuthError::Store(other),
        }
    }
}

/// Registration, login and profile lookup over an injected store.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Expects a normalized email and an already-validated password and name.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserResponse, AuthError> {
        // Fast path for a clear error; the store's unique index is what actually decides.
        if self.users.find_by_email(email).await?.is_some() {
            warn!(email, "email already registered");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = self.hash_password(password).await?;
        let user = self
            .users
            .create(NewUser {
                email: email.to_owned(),
                password_hash,
                name: name.to_owned(),
            })
            .await
            .inspect_err(|e| {
                if matches!(e, StoreError::DuplicateEmail) {
                    warn!(email, "email registered concurrently");
                }
            })?;

        let token = self.tokens.issue(user.id, &user.email)?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(UserResponse::with_token(&user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserResponse, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.verify_password(None, password).await?;
            warn!(email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(Some(user.password_hash.clone()), password)
            .await?
        {
            warn!(email, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        info!(user_id = user.id, email = %user.email, "user logged in");
        Ok(UserResponse::with_token(&user, token))
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Blocking(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Argon2 runs on the blocking pool. With no digest the dummy one is checked
    /// so unknown emails cost the same as wrong passwords.
    async fn verify_password(
        &self,
        digest: Option<String>,
        password: &str,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&digest, &password),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AuthError::Blocking(e.to_string()))
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserResponse, AuthError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(UserResponse::from(&user)),
            None => {
                debug!(user_id, "token references a missing user");
                Err(AuthError::UserNotFound(user_id))
            }
        }
    }
}
