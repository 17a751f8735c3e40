use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{error, warn};

lazy_static! {
    // Same parameters as real digests, so checking against it costs the same.
    static ref DUMMY_DIGEST: String = PasswordHasher::new()
        .hash("no-such-account")
        .unwrap_or_default();
}

#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
}

/// Argon2id with the crate's default cost; the PHC string embeds salt and parameters.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::HashingFailed(e.to_string())
            })
    }

    /// False on mismatch and on a digest that does not parse.
    pub fn verify(&self, digest: &str, plain: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Runs a full verification against a throwaway digest; always false.
    /// Used when there is no stored digest to check, so that path takes as long as a real one.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        let _ = self.verify(dummy_digest(), plain);
        false
    }
}

pub(crate) fn dummy_digest() -> &'static str {
    DUMMY_DIGEST.as_str()
}
