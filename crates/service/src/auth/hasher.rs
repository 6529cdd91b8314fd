use argon2::{
    password_hash::{PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};
use rand::rngs::OsRng;

use super::errors::AuthError;

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;
    /// `Ok(false)` on mismatch; `Err` only when the stored digest is unreadable.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError>;
    fn algorithm(&self) -> &'static str;
}

/// Argon2id hasher producing PHC strings.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) }
    }

    /// Minimum-cost parameters for tests and local tooling.
    pub fn low_cost() -> Result<Self, AuthError> {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Self::new(params))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(digest).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(self.argon.verify_password(plaintext.as_bytes(), &parsed).is_ok())
    }

    fn algorithm(&self) -> &'static str {
        "argon2id"
    }
}
