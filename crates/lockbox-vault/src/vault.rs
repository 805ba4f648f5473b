// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault orchestration: accounts, sessions and per-user record encryption.
//!
//! Record secrets are sealed under the owner's data-encryption key (DEK).
//! The DEK is recovered from the wrapped copy at `authenticate` and then
//! lives only in the [`SessionKeyCache`] until logout or expiry.

use std::sync::Arc;

use chrono::Utc;
use lockbox_config::LockboxConfig;
use lockbox_core::{
    CredentialUpdate, IdentityStore, LockboxError, RecordChanges, RecordId, RecordStore,
    SealedSecrets, UserId, UserRecord, VaultRecord,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto;
use crate::generator::{GeneratorOptions, PasswordGenerator};
use crate::hasher::PasswordHasher;
use crate::keys::{DataKey, KeyManager};
use crate::random;
use crate::record::{Record, RecordFields};
use crate::session::{SessionKeyCache, SessionKeyHandle};

/// The password vault.
///
/// Cheap to share behind an `Arc`; all mutable state is in the stores and
/// the session cache.
pub struct VaultCore {
    identities: Arc<dyn IdentityStore>,
    records: Arc<dyn RecordStore>,
    sessions: SessionKeyCache,
    keys: KeyManager,
    hasher: PasswordHasher,
    generator: PasswordGenerator,
    decoy_hash: OnceCell<String>,
}

impl std::fmt::Debug for VaultCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCore")
            .field("sessions", &self.sessions)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl VaultCore {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        records: Arc<dyn RecordStore>,
        sessions: SessionKeyCache,
        config: &LockboxConfig,
    ) -> Result<Self, LockboxError> {
        Ok(Self {
            identities,
            records,
            sessions,
            keys: KeyManager::new(&config.vault),
            hasher: PasswordHasher::new(&config.hasher)?,
            generator: PasswordGenerator::new(&config.generator),
            decoy_hash: OnceCell::new(),
        })
    }

    /// The session cache this vault issues handles from.
    pub fn sessions(&self) -> &SessionKeyCache {
        &self.sessions
    }

    pub fn generator(&self) -> &PasswordGenerator {
        &self.generator
    }

    /// Register a new account and enroll a fresh data-encryption key for it.
    pub async fn create_user(&self, identity: &str, password: &str) -> Result<UserId, LockboxError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(LockboxError::Validation("identity must not be empty".into()));
        }
        if password.is_empty() {
            return Err(LockboxError::Validation("password must not be empty".into()));
        }

        if self.identities.find_user(identity).await?.is_some() {
            return Err(LockboxError::Conflict("identity already registered".into()));
        }

        let enrollment = self.keys.enroll(password)?;
        let password_hash = self.hasher.hash(password)?;
        let now = Utc::now();

        let user = UserRecord {
            id: UserId::generate(),
            identity: identity.to_string(),
            password_hash,
            wrapped_key: enrollment.wrapped_key,
            kdf_salt: enrollment.salt.to_vec(),
            kdf_params: enrollment.params,
            created_at: now,
            updated_at: now,
        };

        let user_id = self.identities.insert_user(user).await?;
        info!(user_id = %user_id, "user created");
        Ok(user_id)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown identities and wrong passwords fail identically. An unknown
    /// identity is still checked against a decoy hash so both paths do the
    /// same work.
    pub async fn authenticate(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<SessionKeyHandle, LockboxError> {
        let Some(user) = self.identities.find_user(identity.trim()).await? else {
            let decoy = self.decoy_hash().await?;
            let _ = self.hasher.verify(password, decoy);
            debug!("authentication failed");
            return Err(LockboxError::Authentication);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            debug!(user_id = %user.id, "authentication failed");
            return Err(LockboxError::Authentication);
        }

        let dek = self
            .keys
            .unlock(password, &user.wrapped_key, &user.kdf_salt, &user.kdf_params)
            .inspect_err(|_| {
                warn!(user_id = %user.id, "password verified but key unwrap failed");
            })?;

        let handle = self.sessions.insert(user.id.clone(), dek).await?;
        info!(user_id = %user.id, "session opened");
        Ok(handle)
    }

    /// End a session and drop its key. Ending an unknown session is a no-op.
    pub async fn logout(&self, handle: &SessionKeyHandle) {
        if self.sessions.revoke(handle).await {
            debug!("session closed");
        }
    }

    /// Change the login password.
    ///
    /// The existing data-encryption key is re-wrapped under the new password
    /// and persisted in one store update; records are not re-encrypted.
    /// Every other session of the user is ended.
    pub async fn change_password(
        &self,
        handle: &SessionKeyHandle,
        current: &str,
        new: &str,
    ) -> Result<(), LockboxError> {
        let (user_id, dek) = self.sessions.resolve(handle).await?;
        if new.is_empty() {
            return Err(LockboxError::Validation("password must not be empty".into()));
        }

        let user = self
            .identities
            .find_user_by_id(&user_id)
            .await?
            .ok_or(LockboxError::Authentication)?;
        if !self.hasher.verify(current, &user.password_hash)? {
            debug!(user_id = %user_id, "password change rejected");
            return Err(LockboxError::Authentication);
        }

        let enrollment = self
            .keys
            .rewrap(DataKey::from_bytes(*dek.expose()), new)?;
        let update = CredentialUpdate {
            password_hash: self.hasher.hash(new)?,
            wrapped_key: enrollment.wrapped_key,
            kdf_salt: enrollment.salt.to_vec(),
            kdf_params: enrollment.params,
            updated_at: Utc::now(),
        };
        self.identities.update_user(&user_id, update).await?;

        let evicted = self.sessions.revoke_user_except(&user_id, handle).await;
        info!(user_id = %user_id, evicted, "password changed");
        Ok(())
    }

    /// Store a new record for the session's user.
    pub async fn create_record(
        &self,
        handle: &SessionKeyHandle,
        fields: RecordFields,
    ) -> Result<RecordId, LockboxError> {
        let (user_id, dek) = self.sessions.resolve(handle).await?;
        let fields = fields.normalize()?;
        let secrets = seal_secrets(&dek, &fields)?;
        let now = Utc::now();

        let record = VaultRecord {
            id: RecordId::generate(),
            owner_id: user_id.clone(),
            title: fields.title,
            username: fields.username,
            url: fields.url,
            secrets,
            created_at: now,
            updated_at: now,
        };

        let record_id = self.records.insert(record).await?;
        info!(user_id = %user_id, record_id = %record_id, "record created");
        Ok(record_id)
    }

    /// Fetch and decrypt one of the session user's records.
    pub async fn read_record(
        &self,
        handle: &SessionKeyHandle,
        id: &RecordId,
    ) -> Result<Record, LockboxError> {
        let (user_id, dek) = self.sessions.resolve(handle).await?;
        let stored = self.owned_record(&user_id, id).await?;
        open_record(&dek, stored)
    }

    /// Replace the editable fields of a record. Secrets are sealed again
    /// with fresh nonces.
    pub async fn update_record(
        &self,
        handle: &SessionKeyHandle,
        id: &RecordId,
        fields: RecordFields,
    ) -> Result<(), LockboxError> {
        let (user_id, dek) = self.sessions.resolve(handle).await?;
        self.owned_record(&user_id, id).await?;

        let fields = fields.normalize()?;
        let changes = RecordChanges {
            secrets: seal_secrets(&dek, &fields)?,
            title: fields.title,
            username: fields.username,
            url: fields.url,
            updated_at: Utc::now(),
        };
        self.records.update(id, changes).await?;

        info!(user_id = %user_id, record_id = %id, "record updated");
        Ok(())
    }

    /// Permanently remove a record.
    pub async fn delete_record(
        &self,
        handle: &SessionKeyHandle,
        id: &RecordId,
    ) -> Result<(), LockboxError> {
        let (user_id, _) = self.sessions.resolve(handle).await?;
        self.owned_record(&user_id, id).await?;

        if !self.records.delete(id).await? {
            return Err(LockboxError::NotFound);
        }
        info!(user_id = %user_id, record_id = %id, "record deleted");
        Ok(())
    }

    /// All of the session user's records, most recently updated first.
    pub async fn list_records(&self, handle: &SessionKeyHandle) -> Result<Vec<Record>, LockboxError> {
        let (user_id, dek) = self.sessions.resolve(handle).await?;
        let mut stored = self.records.find_all_by_owner(&user_id).await?;
        stored.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        stored
            .into_iter()
            .map(|record| open_record(&dek, record))
            .collect()
    }

    /// Generate a random password. `None` uses the configured default length.
    pub fn generate_password(
        &self,
        length: Option<usize>,
        options: &GeneratorOptions,
    ) -> Result<SecretString, LockboxError> {
        let length = length.unwrap_or_else(|| self.generator.default_length());
        self.generator.generate(length, options)
    }

    /// Load a record, hiding whether a foreign record exists.
    async fn owned_record(
        &self,
        user_id: &UserId,
        id: &RecordId,
    ) -> Result<VaultRecord, LockboxError> {
        match self.records.find(id).await? {
            Some(record) if &record.owner_id == user_id => Ok(record),
            Some(_) => {
                debug!(user_id = %user_id, record_id = %id, "access to foreign record refused");
                Err(LockboxError::NotFound)
            }
            None => Err(LockboxError::NotFound),
        }
    }

    async fn decoy_hash(&self) -> Result<&str, LockboxError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| async { self.hasher.hash(&random::token_hex(16)?) })
            .await?;
        Ok(hash.as_str())
    }
}

fn seal_secrets(dek: &DataKey, fields: &RecordFields) -> Result<SealedSecrets, LockboxError> {
    let password = crypto::seal(dek.expose(), fields.password.expose_secret().as_bytes())?;
    let notes = fields
        .notes
        .as_ref()
        .map(|notes| crypto::seal(dek.expose(), notes.expose_secret().as_bytes()))
        .transpose()?;
    Ok(SealedSecrets { password, notes })
}

fn open_secret(dek: &DataKey, sealed: &[u8]) -> Result<SecretString, LockboxError> {
    let plain = Zeroizing::new(crypto::open(dek.expose(), sealed)?);
    let text = std::str::from_utf8(&plain)
        .map_err(|_| LockboxError::Internal("decrypted field is not valid UTF-8".into()))?;
    Ok(SecretString::from(text))
}

fn open_record(dek: &DataKey, stored: VaultRecord) -> Result<Record, LockboxError> {
    let password = open_secret(dek, &stored.secrets.password)?;
    let notes = stored
        .secrets
        .notes
        .as_deref()
        .map(|sealed| open_secret(dek, sealed))
        .transpose()?;

    Ok(Record {
        id: stored.id,
        title: stored.title,
        username: stored.username,
        url: stored.url,
        password,
        notes,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    })
}
