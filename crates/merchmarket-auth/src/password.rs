//! Password Service
//!
//! Argon2id hashing with an optional pepper. Hashes are stored as PHC
//! strings, so verification reads the parameters back from the hash and
//! keeps working after the configured costs change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PasswordConfig;
use crate::error::{AuthError, AuthResult};

/// Password service for hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    config: PasswordConfig,
}

impl PasswordService {
    /// Create a new password service
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.check_length(password)?;
        let peppered = self.peppered(password);

        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::PasswordHashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        if password.len() > self.config.max_password_length {
            return Ok(false);
        }
        let peppered = self.peppered(password);

        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Stored password hash is malformed: {}", e)))?;

        match Argon2::default().verify_password(peppered.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    fn check_length(&self, password: &str) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is empty".to_string()));
        }
        if password.len() > self.config.max_password_length {
            return Err(AuthError::InvalidInput(format!(
                "password exceeds {} bytes",
                self.config.max_password_length
            )));
        }
        Ok(())
    }

    fn peppered(&self, password: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", password, pepper)),
            None => Zeroizing::new(password.to_string()),
        }
    }
}
