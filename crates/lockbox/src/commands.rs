// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Every vault command authenticates, performs one action and logs out, so
//! no session outlives the process.

use chrono::{DateTime, Utc};
use lockbox_config::LockboxConfig;
use lockbox_core::{LockboxError, RecordId};
use lockbox_vault::prompt::{self, NEW_PASSWORD_ENV_VAR, RECORD_PASSWORD_ENV_VAR};
use lockbox_vault::{
    GeneratorOptions, PasswordGenerator, Record, RecordFields, SessionKeyHandle, VaultCore,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Shown in place of a password unless the caller asks to reveal it.
const MASK: &str = "********";

/// Plain fields for a new record.
#[derive(Debug)]
pub struct Draft {
    pub title: String,
    pub username: String,
    pub url: Option<String>,
    pub notes: Option<String>,
}

/// Where a record's replacement password comes from during `edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Keep,
    Prompt,
    Generate(Option<usize>),
}

impl PasswordSource {
    pub fn from_flags(prompt: bool, generate: Option<Option<usize>>) -> Self {
        match (prompt, generate) {
            (_, Some(length)) => Self::Generate(length),
            (true, None) => Self::Prompt,
            (false, None) => Self::Keep,
        }
    }
}

/// Field overrides for `edit`. `None` keeps the current value.
#[derive(Debug)]
pub struct Edit {
    pub title: Option<String>,
    pub username: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub new_password: PasswordSource,
}

/// JSON form of a record.
#[derive(Debug, Serialize)]
struct RecordView<'a> {
    id: &'a str,
    title: &'a str,
    username: &'a str,
    url: Option<&'a str>,
    password: &'a str,
    notes: Option<&'a str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> RecordView<'a> {
    fn new(record: &'a Record, reveal: bool) -> Self {
        Self {
            id: record.id.as_str(),
            title: &record.title,
            username: &record.username,
            url: record.url.as_deref(),
            password: mask_secret(&record.password, reveal),
            notes: if reveal {
                record.notes.as_ref().map(|n| n.expose_secret())
            } else {
                record.notes.as_ref().map(|_| MASK)
            },
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The password itself when `reveal` is set, otherwise a fixed mask that
/// gives away nothing about it.
pub fn mask_secret(secret: &SecretString, reveal: bool) -> &str {
    if reveal { secret.expose_secret() } else { MASK }
}

/// One line of `list` output.
pub fn format_row(record: &Record, reveal: bool) -> String {
    format!(
        "{}  {}  {}  {}  {}",
        record.id,
        record.title,
        if record.username.is_empty() {
            "-"
        } else {
            record.username.as_str()
        },
        mask_secret(&record.password, reveal),
        record.url.as_deref().unwrap_or("-"),
    )
}

fn to_json<T: Serialize>(value: &T) -> Result<String, LockboxError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LockboxError::Internal(format!("JSON encoding failed: {e}")))
}

pub fn generator_options(
    no_numbers: bool,
    no_symbols: bool,
    allow_look_alikes: bool,
) -> GeneratorOptions {
    GeneratorOptions {
        include_numbers: !no_numbers,
        include_symbols: !no_symbols,
        exclude_look_alikes: !allow_look_alikes,
    }
}

/// `lockbox generate`: needs no account and touches no storage.
pub fn generate(
    config: &LockboxConfig,
    length: Option<usize>,
    options: &GeneratorOptions,
) -> Result<(), LockboxError> {
    let generator = PasswordGenerator::new(&config.generator);
    let length = length.unwrap_or_else(|| generator.default_length());
    let password = generator.generate(length, options)?;
    println!("{}", password.expose_secret());
    Ok(())
}

pub async fn signup(vault: &VaultCore, identity: &str) -> Result<(), LockboxError> {
    let password = prompt::read_new_password(NEW_PASSWORD_ENV_VAR)?;
    let user_id = vault.create_user(identity, password.expose_secret()).await?;
    println!("created account {user_id}");
    Ok(())
}

pub async fn passwd(vault: &VaultCore, identity: &str) -> Result<(), LockboxError> {
    let current = prompt::read_password()?;
    let session = vault.authenticate(identity, current.expose_secret()).await?;
    let result = match prompt::read_new_password(NEW_PASSWORD_ENV_VAR) {
        Ok(new) => {
            vault
                .change_password(&session, current.expose_secret(), new.expose_secret())
                .await
        }
        Err(e) => Err(e),
    };
    vault.logout(&session).await;
    result?;
    println!("password changed");
    Ok(())
}

async fn login(vault: &VaultCore, identity: &str) -> Result<SessionKeyHandle, LockboxError> {
    let password = prompt::read_password()?;
    vault.authenticate(identity, password.expose_secret()).await
}

fn record_password(
    vault: &VaultCore,
    generate: Option<Option<usize>>,
) -> Result<SecretString, LockboxError> {
    match generate {
        Some(length) => vault.generate_password(length, &GeneratorOptions::default()),
        None => prompt::read_secret(RECORD_PASSWORD_ENV_VAR, "Record password"),
    }
}

pub async fn add(
    vault: &VaultCore,
    identity: &str,
    draft: Draft,
    generate: Option<Option<usize>>,
) -> Result<(), LockboxError> {
    let password = record_password(vault, generate)?;
    let session = login(vault, identity).await?;
    let id = create(vault, &session, draft, password).await;
    vault.logout(&session).await;
    println!("{}", id?);
    Ok(())
}

async fn create(
    vault: &VaultCore,
    session: &SessionKeyHandle,
    draft: Draft,
    password: SecretString,
) -> Result<RecordId, LockboxError> {
    let fields = RecordFields {
        title: draft.title,
        username: draft.username,
        url: draft.url,
        password,
        notes: draft.notes.map(SecretString::from),
    };
    vault.create_record(session, fields).await
}

pub async fn list(
    vault: &VaultCore,
    identity: &str,
    reveal: bool,
    json: bool,
) -> Result<(), LockboxError> {
    let session = login(vault, identity).await?;
    let records = vault.list_records(&session).await;
    vault.logout(&session).await;
    let records = records?;

    if json {
        let views: Vec<RecordView<'_>> =
            records.iter().map(|r| RecordView::new(r, reveal)).collect();
        println!("{}", to_json(&views)?);
    } else if records.is_empty() {
        println!("no records");
    } else {
        for record in &records {
            println!("{}", format_row(record, reveal));
        }
    }
    Ok(())
}

pub async fn show(
    vault: &VaultCore,
    identity: &str,
    id: &str,
    json: bool,
) -> Result<(), LockboxError> {
    let session = login(vault, identity).await?;
    let record = vault.read_record(&session, &RecordId::from(id)).await;
    vault.logout(&session).await;
    let record = record?;

    if json {
        println!("{}", to_json(&RecordView::new(&record, true))?);
        return Ok(());
    }

    println!("id:       {}", record.id);
    println!("title:    {}", record.title);
    println!("username: {}", record.username);
    println!("url:      {}", record.url.as_deref().unwrap_or("-"));
    println!("password: {}", record.password.expose_secret());
    if let Some(notes) = &record.notes {
        println!("notes:    {}", notes.expose_secret());
    }
    println!("updated:  {}", record.updated_at.to_rfc3339());
    Ok(())
}

/// Overlay `edit` onto the current record, producing a full replacement.
pub fn apply_edit(current: Record, edit: Edit, new_password: Option<SecretString>) -> RecordFields {
    RecordFields {
        title: edit.title.unwrap_or(current.title),
        username: edit.username.unwrap_or(current.username),
        url: match edit.url {
            Some(url) => Some(url),
            None => current.url,
        },
        password: new_password.unwrap_or(current.password),
        notes: match edit.notes {
            Some(notes) => Some(SecretString::from(notes)),
            None => current.notes,
        },
    }
}

pub async fn edit(
    vault: &VaultCore,
    identity: &str,
    id: &str,
    edit: Edit,
) -> Result<(), LockboxError> {
    let new_password = match edit.new_password {
        PasswordSource::Keep => None,
        PasswordSource::Prompt => Some(prompt::read_secret(
            RECORD_PASSWORD_ENV_VAR,
            "New record password",
        )?),
        PasswordSource::Generate(length) => {
            Some(vault.generate_password(length, &GeneratorOptions::default())?)
        }
    };

    let session = login(vault, identity).await?;
    let id = RecordId::from(id);
    let result = async {
        let current = vault.read_record(&session, &id).await?;
        let fields = apply_edit(current, edit, new_password);
        vault.update_record(&session, &id, fields).await
    }
    .await;
    vault.logout(&session).await;
    result?;

    println!("updated {id}");
    Ok(())
}

pub async fn remove(vault: &VaultCore, identity: &str, id: &str) -> Result<(), LockboxError> {
    let session = login(vault, identity).await?;
    let id = RecordId::from(id);
    let result = vault.delete_record(&session, &id).await;
    vault.logout(&session).await;
    result?;

    println!("deleted {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_test_utils::TestHarness;
    use lockbox_vault::prompt::PASSWORD_ENV_VAR;
    use serial_test::serial;

    fn record() -> Record {
        let now = Utc::now();
        Record {
            id: RecordId::from("r1"),
            title: "Bank".to_string(),
            username: "alice".to_string(),
            url: Some("https://bank.example".to_string()),
            password: SecretString::from("s3cr3t"),
            notes: Some(SecretString::from("pin 0000")),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn list_row_masks_password() {
        let row = format_row(&record(), false);
        assert!(row.contains("Bank"));
        assert!(row.contains(MASK));
        assert!(!row.contains("s3cr3t"));

        assert!(format_row(&record(), true).contains("s3cr3t"));
    }

    #[test]
    fn json_view_masks_secrets_unless_revealed() {
        let record = record();
        let masked = serde_json::to_value(RecordView::new(&record, false)).unwrap();
        assert_eq!(masked["password"], MASK);
        assert_eq!(masked["notes"], MASK);
        assert_eq!(masked["url"], "https://bank.example");

        let revealed = serde_json::to_value(RecordView::new(&record, true)).unwrap();
        assert_eq!(revealed["password"], "s3cr3t");
        assert_eq!(revealed["notes"], "pin 0000");
    }

    #[test]
    fn password_source_flags() {
        assert_eq!(PasswordSource::from_flags(false, None), PasswordSource::Keep);
        assert_eq!(PasswordSource::from_flags(true, None), PasswordSource::Prompt);
        assert_eq!(
            PasswordSource::from_flags(false, Some(Some(20))),
            PasswordSource::Generate(Some(20))
        );
    }

    #[test]
    fn generator_flags_invert_into_options() {
        let options = generator_options(true, false, true);
        assert!(!options.include_numbers);
        assert!(options.include_symbols);
        assert!(!options.exclude_look_alikes);
        assert_eq!(generator_options(false, false, false), GeneratorOptions::default());
    }

    #[test]
    fn apply_edit_overlays_only_given_fields() {
        let edit = Edit {
            title: None,
            username: Some("alice2".to_string()),
            url: Some(String::new()),
            notes: None,
            new_password: PasswordSource::Keep,
        };
        let fields = apply_edit(record(), edit, None);
        assert_eq!(fields.title, "Bank");
        assert_eq!(fields.username, "alice2");
        assert_eq!(fields.url.as_deref(), Some(""));
        assert_eq!(fields.password.expose_secret(), "s3cr3t");
        assert_eq!(
            fields.notes.as_ref().map(|n| n.expose_secret().to_string()),
            Some("pin 0000".to_string())
        );
    }

    #[tokio::test]
    async fn edit_with_empty_url_clears_it() {
        let h = TestHarness::new().await.unwrap();
        let session = h.signup_and_login("alice", "correcthorse").await.unwrap();
        let id = h
            .vault
            .create_record(
                &session,
                RecordFields::new("Bank", "alice", "s3cr3t").with_url("https://bank.example"),
            )
            .await
            .unwrap();

        let current = h.vault.read_record(&session, &id).await.unwrap();
        let edit = Edit {
            title: None,
            username: None,
            url: Some(String::new()),
            notes: None,
            new_password: PasswordSource::Keep,
        };
        h.vault
            .update_record(&session, &id, apply_edit(current, edit, None))
            .await
            .unwrap();

        let updated = h.vault.read_record(&session, &id).await.unwrap();
        assert!(updated.url.is_none());
        assert_eq!(updated.password.expose_secret(), "s3cr3t");
    }

    #[tokio::test]
    #[serial]
    async fn signup_reads_new_password_variable() {
        let h = TestHarness::new().await.unwrap();
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe {
            std::env::remove_var(PASSWORD_ENV_VAR);
            std::env::set_var(NEW_PASSWORD_ENV_VAR, "correcthorse");
        }
        let result = signup(&h.vault, "alice").await;
        unsafe { std::env::remove_var(NEW_PASSWORD_ENV_VAR) };

        result.unwrap();
        assert!(h.vault.authenticate("alice", "correcthorse").await.is_ok());
    }
}
