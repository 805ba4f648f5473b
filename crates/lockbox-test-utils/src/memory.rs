// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store implementations for deterministic testing.
//!
//! Both stores keep exactly what they are given, so tests can inspect the
//! persisted form of users and records. `fail_next()` makes the next call
//! return a storage error.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lockbox_core::{
    CredentialUpdate, IdentityStore, LockboxError, RecordChanges, RecordId, RecordStore, UserId,
    UserRecord, VaultRecord,
};
use tokio::sync::Mutex;

fn injected_failure(flag: &AtomicBool) -> Result<(), LockboxError> {
    if flag.swap(false, Ordering::SeqCst) {
        return Err(LockboxError::storage("injected storage failure"));
    }
    Ok(())
}

/// Map-backed [`IdentityStore`].
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with [`LockboxError::Storage`].
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Every stored user, as persisted.
    pub async fn users(&self) -> Vec<UserRecord> {
        self.users.lock().await.values().cloned().collect()
    }

    /// Overwrite a stored user, bypassing the trait.
    pub async fn put(&self, user: UserRecord) {
        self.users.lock().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_user(&self, identity: &str) -> Result<Option<UserRecord>, LockboxError> {
        injected_failure(&self.fail)?;
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.identity == identity)
            .cloned())
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, LockboxError> {
        injected_failure(&self.fail)?;
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn insert_user(&self, user: UserRecord) -> Result<UserId, LockboxError> {
        injected_failure(&self.fail)?;
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.identity == user.identity) {
            return Err(LockboxError::Conflict("identity already registered".into()));
        }
        let id = user.id.clone();
        users.insert(id.clone(), user);
        Ok(id)
    }

    async fn update_user(&self, id: &UserId, update: CredentialUpdate) -> Result<(), LockboxError> {
        injected_failure(&self.fail)?;
        let mut users = self.users.lock().await;
        let user = users.get_mut(id).ok_or(LockboxError::NotFound)?;
        user.password_hash = update.password_hash;
        user.wrapped_key = update.wrapped_key;
        user.kdf_salt = update.kdf_salt;
        user.kdf_params = update.kdf_params;
        user.updated_at = update.updated_at;
        Ok(())
    }
}

/// Map-backed [`RecordStore`].
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<RecordId, VaultRecord>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with [`LockboxError::Storage`].
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Every stored record, as persisted.
    pub async fn records(&self) -> Vec<VaultRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Overwrite a stored record, bypassing the trait.
    pub async fn put(&self, record: VaultRecord) {
        self.records.lock().await.insert(record.id.clone(), record);
    }

    /// All stored bytes of every record, concatenated. Used to assert that
    /// no plaintext secret is persisted.
    pub async fn persisted_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for record in self.records.lock().await.values() {
            out.extend_from_slice(record.title.as_bytes());
            out.extend_from_slice(record.username.as_bytes());
            if let Some(url) = &record.url {
                out.extend_from_slice(url.as_bytes());
            }
            out.extend_from_slice(&record.secrets.password);
            if let Some(notes) = &record.secrets.notes {
                out.extend_from_slice(notes);
            }
        }
        out
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, id: &RecordId) -> Result<Option<VaultRecord>, LockboxError> {
        injected_failure(&self.fail)?;
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn find_all_by_owner(&self, owner: &UserId) -> Result<Vec<VaultRecord>, LockboxError> {
        injected_failure(&self.fail)?;
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn insert(&self, record: VaultRecord) -> Result<RecordId, LockboxError> {
        injected_failure(&self.fail)?;
        let id = record.id.clone();
        self.records.lock().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn update(&self, id: &RecordId, changes: RecordChanges) -> Result<(), LockboxError> {
        injected_failure(&self.fail)?;
        let mut records = self.records.lock().await;
        let record = records.get_mut(id).ok_or(LockboxError::NotFound)?;
        record.apply(changes);
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, LockboxError> {
        injected_failure(&self.fail)?;
        Ok(self.records.lock().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lockbox_core::{KdfParams, SealedSecrets};

    fn user(identity: &str) -> UserRecord {
        UserRecord {
            id: UserId::generate(),
            identity: identity.to_string(),
            password_hash: "hash".to_string(),
            wrapped_key: vec![1],
            kdf_salt: vec![2],
            kdf_params: KdfParams {
                memory_cost: 8192,
                iterations: 1,
                parallelism: 1,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_identity_conflicts() {
        let store = MemoryIdentityStore::new();
        store.insert_user(user("alice")).await.unwrap();
        assert!(matches!(
            store.insert_user(user("alice")).await,
            Err(LockboxError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn fail_next_fails_once() {
        let store = MemoryRecordStore::new();
        store.fail_next();
        assert!(matches!(
            store.find(&RecordId::from("x")).await,
            Err(LockboxError::Storage { .. })
        ));
        assert!(store.find(&RecordId::from("x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persisted_bytes_include_ciphertext() {
        let store = MemoryRecordStore::new();
        let now = Utc::now();
        store
            .insert(VaultRecord {
                id: RecordId::generate(),
                owner_id: UserId::from("u"),
                title: "Bank".into(),
                username: "alice".into(),
                url: None,
                secrets: SealedSecrets {
                    password: vec![0xAB, 0xCD],
                    notes: None,
                },
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let bytes = store.persisted_bytes().await;
        assert!(bytes.windows(2).any(|w| w == [0xAB, 0xCD]));
        assert!(bytes.windows(4).any(|w| w == b"Bank"));
    }
}
