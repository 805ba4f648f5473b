// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait: opaque vault records keyed by id and owner.

use async_trait::async_trait;

use crate::error::LockboxError;
use crate::types::{RecordChanges, RecordId, UserId, VaultRecord};

/// Persistence for vault records.
///
/// Secret fields arrive already sealed. Implementations store them as opaque
/// blobs and never inspect them. Every write is a single atomic persist.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Fetches a record by id, regardless of owner.
    async fn find(&self, id: &RecordId) -> Result<Option<VaultRecord>, LockboxError>;

    /// Fetches all records belonging to `owner`, in no particular order.
    async fn find_all_by_owner(&self, owner: &UserId) -> Result<Vec<VaultRecord>, LockboxError>;

    /// Inserts a new record and returns its id.
    async fn insert(&self, record: VaultRecord) -> Result<RecordId, LockboxError>;

    /// Replaces the editable fields of a record. Fails with
    /// [`LockboxError::NotFound`] if the record is absent.
    async fn update(&self, id: &RecordId, changes: RecordChanges) -> Result<(), LockboxError>;

    /// Hard-deletes a record. Returns `false` if it did not exist.
    async fn delete(&self, id: &RecordId) -> Result<bool, LockboxError>;
}
