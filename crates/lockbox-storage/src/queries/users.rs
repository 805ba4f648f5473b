// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account CRUD operations.

use lockbox_core::{CredentialUpdate, KdfParams, LockboxError, UserId, UserRecord};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use super::{decode_ts, encode_ts};
use crate::database::{Database, map_tr_err};

const USER_COLUMNS: &str = "id, identity, password_hash, wrapped_key, kdf_salt, kdf_params, created_at, updated_at";

fn row_to_user(row: &Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    let params_json: String = row.get(5)?;
    let kdf_params: KdfParams = serde_json::from_str(&params_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(UserRecord {
        id: UserId(row.get(0)?),
        identity: row.get(1)?,
        password_hash: row.get(2)?,
        wrapped_key: row.get(3)?,
        kdf_salt: row.get(4)?,
        kdf_params,
        created_at: decode_ts(6, &created_at)?,
        updated_at: decode_ts(7, &updated_at)?,
    })
}

fn encode_params(params: &KdfParams) -> Result<String, LockboxError> {
    serde_json::to_string(params).map_err(LockboxError::storage)
}

/// Get a user by login identity.
pub async fn get_user_by_identity(
    db: &Database,
    identity: &str,
) -> Result<Option<UserRecord>, LockboxError> {
    let identity = identity.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE identity = ?1"),
                params![identity],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get a user by ID.
pub async fn get_user(db: &Database, id: &UserId) -> Result<Option<UserRecord>, LockboxError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new user. An existing identity (or id) is a conflict.
pub async fn insert_user(db: &Database, user: UserRecord) -> Result<UserId, LockboxError> {
    let kdf_params = encode_params(&user.kdf_params)?;
    let id = user.id.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users
                    (id, identity, password_hash, wrapped_key, kdf_salt, kdf_params, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id.0,
                    user.identity,
                    user.password_hash,
                    user.wrapped_key,
                    user.kdf_salt,
                    kdf_params,
                    encode_ts(&user.created_at),
                    encode_ts(&user.updated_at),
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if inserted == 0 {
        return Err(LockboxError::Conflict("identity already registered".into()));
    }
    Ok(id)
}

/// Replace a user's credential material in a single statement.
pub async fn update_credentials(
    db: &Database,
    id: &UserId,
    update: CredentialUpdate,
) -> Result<(), LockboxError> {
    let kdf_params = encode_params(&update.kdf_params)?;
    let id = id.0.clone();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users
                    SET password_hash = ?2, wrapped_key = ?3, kdf_salt = ?4, kdf_params = ?5, updated_at = ?6
                  WHERE id = ?1",
                params![
                    id,
                    update.password_hash,
                    update.wrapped_key,
                    update.kdf_salt,
                    kdf_params,
                    encode_ts(&update.updated_at),
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
