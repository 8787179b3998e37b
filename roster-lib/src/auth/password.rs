use argon2::Config;
use std::fmt::Debug;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Unable to hash password")]
    Hash(#[from] argon2::Error),
}

pub trait PasswordHasher: Send + Sync + Debug {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Returns false for a wrong password as well as for a malformed hash.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

/// Argon2 with a random 32 byte salt, stored in the PHC encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Hasher {
    pub mem_cost: u32,
    pub time_cost: u32,
}

impl Argon2Hasher {
    pub fn with_cost(mem_cost: u32, time_cost: u32) -> Argon2Hasher {
        Argon2Hasher {
            mem_cost,
            time_cost,
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        let config = Config::default();
        Argon2Hasher::with_cost(config.mem_cost, config.time_cost)
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let config = Config {
            mem_cost: self.mem_cost,
            time_cost: self.time_cost,
            ..Config::default()
        };
        let salt: [u8; 32] = rand::random();
        let password_hash = argon2::hash_encoded(password.as_bytes(), &salt, &config)?;
        Ok(password_hash)
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        match argon2::verify_encoded(password_hash, password.as_bytes()) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "Unable to verify password against stored hash");
                false
            }
        }
    }
}
