// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login password hashing (Argon2id, PHC string format).

use argon2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use lockbox_config::model::HasherConfig;
use lockbox_core::LockboxError;

use crate::random;

/// Hashes and verifies login passwords.
///
/// Each hash carries its own salt and cost parameters, so raising the
/// configured cost only affects hashes produced afterwards.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(config: &HasherConfig) -> Result<Self, LockboxError> {
        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| LockboxError::Config(format!("invalid [hasher] parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, LockboxError> {
        let salt_bytes: [u8; 16] = random::array()?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| LockboxError::Internal(format!("salt encoding failed: {e}")))?;

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| LockboxError::Internal(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`. Only an unparseable `hash` is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, LockboxError> {
        let parsed = PasswordHash::new(hash).map_err(|e| LockboxError::Format(e.to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(LockboxError::Format(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&HasherConfig {
            memory_cost: 8192,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correcthorse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correcthorse", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = hasher();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn hash_never_contains_password() {
        let hash = hasher().hash("correcthorse").unwrap();
        assert!(!hash.contains("correcthorse"));
    }

    #[test]
    fn verify_uses_params_embedded_in_hash() {
        let old = hasher();
        let hash = old.hash("pw").unwrap();

        let stronger = PasswordHasher::new(&HasherConfig {
            memory_cost: 16384,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("pw", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_format_error() {
        assert!(matches!(
            hasher().verify("pw", "not-a-phc-string"),
            Err(LockboxError::Format(_))
        ));
    }

    #[test]
    fn zero_iterations_is_config_error() {
        let result = PasswordHasher::new(&HasherConfig {
            memory_cost: 8192,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(LockboxError::Config(_))));
    }
}
