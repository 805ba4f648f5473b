// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the store traits.
//!
//! Both stores wrap a clone of the same [`Database`] and delegate to the
//! typed query modules.

use async_trait::async_trait;
use lockbox_core::{
    CredentialUpdate, IdentityStore, LockboxError, RecordChanges, RecordId, RecordStore, UserId,
    UserRecord, VaultRecord,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed [`IdentityStore`].
#[derive(Debug, Clone)]
pub struct SqliteIdentityStore {
    db: Database,
}

impl SqliteIdentityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_user(&self, identity: &str) -> Result<Option<UserRecord>, LockboxError> {
        queries::users::get_user_by_identity(&self.db, identity).await
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, LockboxError> {
        queries::users::get_user(&self.db, id).await
    }

    async fn insert_user(&self, user: UserRecord) -> Result<UserId, LockboxError> {
        queries::users::insert_user(&self.db, user).await
    }

    async fn update_user(&self, id: &UserId, update: CredentialUpdate) -> Result<(), LockboxError> {
        queries::users::update_credentials(&self.db, id, update).await
    }
}

/// SQLite-backed [`RecordStore`].
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find(&self, id: &RecordId) -> Result<Option<VaultRecord>, LockboxError> {
        queries::records::get_record(&self.db, id).await
    }

    async fn find_all_by_owner(&self, owner: &UserId) -> Result<Vec<VaultRecord>, LockboxError> {
        queries::records::list_records(&self.db, owner).await
    }

    async fn insert(&self, record: VaultRecord) -> Result<RecordId, LockboxError> {
        queries::records::insert_record(&self.db, record).await
    }

    async fn update(&self, id: &RecordId, changes: RecordChanges) -> Result<(), LockboxError> {
        queries::records::update_record(&self.db, id, changes).await
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, LockboxError> {
        queries::records::delete_record(&self.db, id).await
    }
}
