// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox password vault.

use thiserror::Error;

/// The primary error type used across the store traits and vault operations.
///
/// Variants never carry plaintext secrets, key bytes, or cryptographic cause
/// strings. Use [`LockboxError::public_message`] when rendering an error to
/// an untrusted caller.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// Malformed input or out-of-range parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrong password, tampered ciphertext, failed tag check, or an unknown
    /// or expired session. Deliberately carries no cause.
    #[error("invalid credentials")]
    Authentication,

    /// Duplicate identity at signup.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing record, or a record owned by somebody else.
    #[error("not found")]
    NotFound,

    /// A stored password hash could not be parsed.
    #[error("malformed password hash: {0}")]
    Format(String),

    /// Configuration errors (invalid values, unreadable files).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LockboxError {
    /// Shorthand for wrapping any storage-side failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// The message that may be shown to a caller outside the vault.
    ///
    /// Collaborator faults and internal causes collapse to a generic string.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(reason) => format!("invalid input: {reason}"),
            Self::Authentication => "invalid credentials".to_string(),
            Self::Conflict(reason) => reason.clone(),
            Self::NotFound => "not found".to_string(),
            Self::Config(reason) => format!("configuration error: {reason}"),
            Self::Format(_) | Self::Storage { .. } | Self::Internal(_) => {
                "internal error".to_string()
            }
        }
    }

    /// Whether the failure came from a collaborator rather than the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal(_))
    }
}
