// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared between the vault and its stores.
//!
//! Everything here is the *persisted* shape: secret fields are opaque
//! ciphertext and the wrapped key is opaque to every store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Allocate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier of a user account.
    UserId
);

string_id!(
    /// Unique identifier of a vault record.
    RecordId
);

/// Argon2id cost parameters used to derive a user's key-encryption key.
///
/// Stored per user so that changing the configured cost never locks out
/// accounts enrolled under the old parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Iteration count.
    pub iterations: u32,
    /// Parallelism lanes.
    pub parallelism: u32,
}

/// A user account as held by the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    /// Login handle (e.g. an e-mail address). Immutable after creation.
    pub identity: String,
    /// Argon2id PHC string of the login password.
    pub password_hash: String,
    /// The data-encryption key sealed under the password-derived key.
    pub wrapped_key: Vec<u8>,
    /// Salt for the key-encryption key derivation.
    pub kdf_salt: Vec<u8>,
    pub kdf_params: KdfParams,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Replacement credential material written when a password changes.
///
/// Applied by the identity store as a single atomic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub password_hash: String,
    pub wrapped_key: Vec<u8>,
    pub kdf_salt: Vec<u8>,
    pub kdf_params: KdfParams,
    pub updated_at: DateTime<Utc>,
}

/// Secret record fields, each sealed under the owner's data-encryption key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecrets {
    pub password: Vec<u8>,
    pub notes: Option<Vec<u8>>,
}

/// A vault record as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    pub id: RecordId,
    /// Owning user. Never changes after creation.
    pub owner_id: UserId,
    pub title: String,
    pub username: String,
    pub url: Option<String>,
    pub secrets: SealedSecrets,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The editable part of a vault record, persisted in one store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChanges {
    pub title: String,
    pub username: String,
    pub url: Option<String>,
    pub secrets: SealedSecrets,
    pub updated_at: DateTime<Utc>,
}

impl VaultRecord {
    /// Apply a change set in place, leaving id, owner and creation time alone.
    pub fn apply(&mut self, changes: RecordChanges) {
        self.title = changes.title;
        self.username = changes.username;
        self.url = changes.url;
        self.secrets = changes.secrets;
        self.updated_at = changes.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn kdf_params_json_roundtrip() {
        let params = KdfParams {
            memory_cost: 65536,
            iterations: 3,
            parallelism: 4,
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"memory_cost\":65536"));
        let parsed: KdfParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn apply_keeps_identity_fields() {
        let created = Utc::now();
        let mut record = VaultRecord {
            id: RecordId::from("r1"),
            owner_id: UserId::from("u1"),
            title: "Bank".into(),
            username: "alice".into(),
            url: None,
            secrets: SealedSecrets {
                password: vec![1, 2, 3],
                notes: None,
            },
            created_at: created,
            updated_at: created,
        };
        let later = created + chrono::Duration::seconds(5);
        record.apply(RecordChanges {
            title: "Bank (joint)".into(),
            username: "alice".into(),
            url: Some("https://bank.example".into()),
            secrets: SealedSecrets {
                password: vec![4, 5, 6],
                notes: Some(vec![7]),
            },
            updated_at: later,
        });

        assert_eq!(record.id.as_str(), "r1");
        assert_eq!(record.owner_id.as_str(), "u1");
        assert_eq!(record.created_at, created);
        assert_eq!(record.updated_at, later);
        assert_eq!(record.title, "Bank (joint)");
    }
}
