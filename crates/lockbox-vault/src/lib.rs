// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope encryption for the Lockbox password vault.
//!
//! Each user has a random data-encryption key wrapped under an Argon2id
//! derivation of their login password. Record secrets are sealed with
//! AES-256-GCM under that data key. [`VaultCore`] ties the pieces together
//! over pluggable identity and record stores.

pub mod crypto;
pub mod generator;
pub mod hasher;
pub mod kdf;
pub mod keys;
pub mod prompt;
pub mod random;
pub mod record;
pub mod session;
pub mod vault;

pub use generator::{GeneratorOptions, PasswordGenerator};
pub use hasher::PasswordHasher;
pub use keys::{DataKey, Enrollment, KeyManager};
pub use record::{Record, RecordFields};
pub use session::{SessionKeyCache, SessionKeyHandle};
pub use vault::VaultCore;
