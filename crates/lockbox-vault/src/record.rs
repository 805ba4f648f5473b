// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext views of vault records.

use chrono::{DateTime, Utc};
use lockbox_core::{LockboxError, RecordId};
use secrecy::{ExposeSecret, SecretString};

/// Longest accepted title, username or URL, in characters.
pub const MAX_FIELD_CHARS: usize = 1024;

/// Longest accepted notes field, in characters.
pub const MAX_NOTES_CHARS: usize = 64 * 1024;

/// The caller-supplied fields of a record, used for create and update.
///
/// `password` and `notes` are sealed before they reach a store; the rest is
/// stored as given.
#[derive(Debug, Clone)]
pub struct RecordFields {
    pub title: String,
    pub username: String,
    pub url: Option<String>,
    pub password: SecretString,
    pub notes: Option<SecretString>,
}

impl RecordFields {
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            url: None,
            password: SecretString::from(password.into()),
            notes: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(SecretString::from(notes.into()));
        self
    }

    /// Trim the plain fields, drop blank optionals and enforce limits.
    pub(crate) fn normalize(self) -> Result<Self, LockboxError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(LockboxError::Validation("title must not be empty".into()));
        }
        check_len("title", &title, MAX_FIELD_CHARS)?;

        let username = self.username.trim().to_string();
        check_len("username", &username, MAX_FIELD_CHARS)?;

        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if let Some(url) = &url {
            check_len("url", url, MAX_FIELD_CHARS)?;
        }

        if self.password.expose_secret().is_empty() {
            return Err(LockboxError::Validation("password must not be empty".into()));
        }
        check_len("password", self.password.expose_secret(), MAX_FIELD_CHARS)?;

        let notes = self.notes.filter(|n| !n.expose_secret().is_empty());
        if let Some(notes) = &notes {
            check_len("notes", notes.expose_secret(), MAX_NOTES_CHARS)?;
        }

        Ok(Self {
            title,
            username,
            url,
            password: self.password,
            notes,
        })
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), LockboxError> {
    if value.chars().count() > max {
        return Err(LockboxError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// A decrypted record returned to its owner.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub username: String,
    pub url: Option<String>,
    pub password: SecretString,
    pub notes: Option<SecretString>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
