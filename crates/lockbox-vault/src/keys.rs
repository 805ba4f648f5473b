// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-encryption key lifecycle.
//!
//! Each user owns one random 256-bit data-encryption key (DEK). The DEK is
//! stored only in wrapped form: sealed under a key-encryption key (KEK) that
//! is derived from the login password with Argon2id. Changing the password
//! re-wraps the same DEK, so record ciphertext is never touched.

use std::fmt;

use lockbox_config::model::VaultConfig;
use lockbox_core::{KdfParams, LockboxError};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};
use crate::kdf::{self, SALT_LEN};
use crate::random;

/// A user's data-encryption key. Zeroed on drop, never printed.
pub struct DataKey(Zeroizing<[u8; KEY_LEN]>);

impl DataKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}

/// Everything persisted for a user's key after signup or a password change.
#[derive(Debug)]
pub struct Enrollment {
    pub dek: DataKey,
    pub wrapped_key: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub params: KdfParams,
}

/// Generates, wraps and unwraps data-encryption keys.
#[derive(Debug, Clone)]
pub struct KeyManager {
    params: KdfParams,
}

impl KeyManager {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            params: KdfParams {
                memory_cost: config.kdf_memory_cost,
                iterations: config.kdf_iterations,
                parallelism: config.kdf_parallelism,
            },
        }
    }

    /// The parameters new enrollments are derived with.
    pub fn params(&self) -> KdfParams {
        self.params
    }

    pub fn generate_dek(&self) -> Result<DataKey, LockboxError> {
        Ok(DataKey::from_bytes(random::array()?))
    }

    pub fn generate_salt(&self) -> Result<[u8; SALT_LEN], LockboxError> {
        kdf::generate_salt()
    }

    pub fn derive_kek(
        &self,
        password: &str,
        salt: &[u8],
        params: &KdfParams,
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, LockboxError> {
        kdf::derive_key(password.as_bytes(), salt, params)
    }

    pub fn wrap(&self, dek: &DataKey, kek: &[u8; KEY_LEN]) -> Result<Vec<u8>, LockboxError> {
        crypto::seal(kek, dek.expose())
    }

    /// Recover a DEK. A wrong KEK, tampered bytes or a payload of the wrong
    /// size are all [`LockboxError::Authentication`].
    pub fn unwrap(&self, wrapped: &[u8], kek: &[u8; KEY_LEN]) -> Result<DataKey, LockboxError> {
        let plain = Zeroizing::new(crypto::open(kek, wrapped)?);
        let bytes: [u8; KEY_LEN] = plain
            .as_slice()
            .try_into()
            .map_err(|_| LockboxError::Authentication)?;
        Ok(DataKey::from_bytes(bytes))
    }

    /// Create a new DEK and wrap it under `password`.
    pub fn enroll(&self, password: &str) -> Result<Enrollment, LockboxError> {
        let dek = self.generate_dek()?;
        self.rewrap(dek, password)
    }

    /// Wrap an existing DEK under a new password with a fresh salt and the
    /// currently configured parameters.
    pub fn rewrap(&self, dek: DataKey, password: &str) -> Result<Enrollment, LockboxError> {
        let salt = self.generate_salt()?;
        let kek = self.derive_kek(password, &salt, &self.params)?;
        let wrapped_key = self.wrap(&dek, &kek)?;
        Ok(Enrollment {
            dek,
            wrapped_key,
            salt,
            params: self.params,
        })
    }

    /// Derive the KEK from `password` and the stored salt/params, then
    /// unwrap the DEK.
    pub fn unlock(
        &self,
        password: &str,
        wrapped: &[u8],
        salt: &[u8],
        params: &KdfParams,
    ) -> Result<DataKey, LockboxError> {
        let kek = self.derive_kek(password, salt, params)?;
        self.unwrap(wrapped, &kek)
    }
}
