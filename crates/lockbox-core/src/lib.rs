// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox password vault.
//!
//! Provides the error taxonomy, the persisted domain types, and the two
//! collaborator traits ([`IdentityStore`], [`RecordStore`]) the vault talks
//! to. Store implementations live in `lockbox-storage` (SQLite) and
//! `lockbox-test-utils` (in-memory).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LockboxError;
pub use traits::{IdentityStore, RecordStore};
pub use types::{
    CredentialUpdate, KdfParams, RecordChanges, RecordId, SealedSecrets, UserId, UserRecord,
    VaultRecord,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_traits_are_object_safe() {
        fn _assert_identity_store(_: &dyn IdentityStore) {}
        fn _assert_record_store(_: &dyn RecordStore) {}
    }
}
