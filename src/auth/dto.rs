use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::User;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user; `token` only on register/login.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserResponse {
    pub fn with_token(user: &User, token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::from(user)
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            token: None,
        }
    }
}

/// Response for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

/// Response for the profile endpoint.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl RegisterRequest {
    /// Normalizes in place, returning the first problem found.
    pub fn validate(&mut self) -> Result<(), &'static str> {
        self.email = normalize_email(&self.email);
        self.name = self.name.trim().to_owned();
        if !is_valid_email(&self.email) {
            return Err("Invalid email");
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err("Password must be at least 6 characters");
        }
        if self.name.is_empty() {
            return Err("Name is required");
        }
        Ok(())
    }
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), &'static str> {
        self.email = normalize_email(&self.email);
        if !is_valid_email(&self.email) {
            return Err("Invalid email");
        }
        if self.password.is_empty() {
            return Err("Password is required");
        }
        Ok(())
    }
}
