// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault record CRUD operations.
//!
//! Secret columns are written and read as opaque BLOBs.

use lockbox_core::{LockboxError, RecordChanges, RecordId, SealedSecrets, UserId, VaultRecord};
use rusqlite::{OptionalExtension, Row, params};

use super::{decode_ts, encode_ts};
use crate::database::{Database, map_tr_err};

const RECORD_COLUMNS: &str =
    "id, owner_id, title, username, url, password_ct, notes_ct, created_at, updated_at";

fn row_to_record(row: &Row<'_>) -> Result<VaultRecord, rusqlite::Error> {
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(VaultRecord {
        id: RecordId(row.get(0)?),
        owner_id: UserId(row.get(1)?),
        title: row.get(2)?,
        username: row.get(3)?,
        url: row.get(4)?,
        secrets: SealedSecrets {
            password: row.get(5)?,
            notes: row.get(6)?,
        },
        created_at: decode_ts(7, &created_at)?,
        updated_at: decode_ts(8, &updated_at)?,
    })
}

/// Get a record by ID, whoever owns it.
pub async fn get_record(db: &Database, id: &RecordId) -> Result<Option<VaultRecord>, LockboxError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM vault_records WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List an owner's records, most recently updated first.
pub async fn list_records(db: &Database, owner: &UserId) -> Result<Vec<VaultRecord>, LockboxError> {
    let owner = owner.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM vault_records
                  WHERE owner_id = ?1 ORDER BY updated_at DESC"
            ))?;
            let rows = stmt.query_map(params![owner], row_to_record)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new record.
pub async fn insert_record(db: &Database, record: VaultRecord) -> Result<RecordId, LockboxError> {
    let id = record.id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO vault_records
                    (id, owner_id, title, username, url, password_ct, notes_ct, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.0,
                    record.owner_id.0,
                    record.title,
                    record.username,
                    record.url,
                    record.secrets.password,
                    record.secrets.notes,
                    encode_ts(&record.created_at),
                    encode_ts(&record.updated_at),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// Replace the editable columns of a record in a single statement.
pub async fn update_record(
    db: &Database,
    id: &RecordId,
    changes: RecordChanges,
) -> Result<(), LockboxError> {
    let id = id.0.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE vault_records
                    SET title = ?2, username = ?3, url = ?4, password_ct = ?5, notes_ct = ?6, updated_at = ?7
                  WHERE id = ?1",
                params![
                    id,
                    changes.title,
                    changes.username,
                    changes.url,
                    changes.secrets.password,
                    changes.secrets.notes,
                    encode_ts(&changes.updated_at),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(LockboxError::NotFound);
    }
    Ok(())
}

/// Hard-delete a record. Returns whether a row was removed.
pub async fn delete_record(db: &Database, id: &RecordId) -> Result<bool, LockboxError> {
    let id = id.0.clone();
    let deleted = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM vault_records WHERE id = ?1", params![id]))
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}
