// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity store trait: user accounts and their stored key material.

use async_trait::async_trait;

use crate::error::LockboxError;
use crate::types::{CredentialUpdate, UserId, UserRecord};

/// Persistence for user accounts.
///
/// The wrapped key and password hash are opaque: implementations must not
/// parse, index, or compare on their contents.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Looks up a user by login identity.
    async fn find_user(&self, identity: &str) -> Result<Option<UserRecord>, LockboxError>;

    /// Looks up a user by id.
    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, LockboxError>;

    /// Inserts a new user. Fails with [`LockboxError::Conflict`] if the
    /// identity is already taken.
    async fn insert_user(&self, user: UserRecord) -> Result<UserId, LockboxError>;

    /// Replaces the credential material of an existing user in one atomic
    /// write. Fails with [`LockboxError::NotFound`] if the user is absent.
    async fn update_user(&self, id: &UserId, update: CredentialUpdate)
        -> Result<(), LockboxError>;
}
