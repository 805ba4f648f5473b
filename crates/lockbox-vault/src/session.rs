// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, expiring cache of unwrapped data-encryption keys.
//!
//! `authenticate` unwraps a user's DEK once and parks it here under a random
//! session id. Callers hold only a [`SessionKeyHandle`]; the key bytes never
//! leave the cache except as a shared reference for the duration of one
//! operation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lockbox_config::model::SessionConfig;
use lockbox_core::{LockboxError, UserId};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::keys::DataKey;
use crate::random;

/// Random bytes in a session id (hex-encoded to twice this length).
const SESSION_ID_BYTES: usize = 32;

/// Opaque reference to an authenticated session.
///
/// Holds only the session id. Dropping it does not end the session; call
/// `VaultCore::logout`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionKeyHandle {
    session_id: String,
}

impl SessionKeyHandle {
    /// The bearer token form of this handle.
    pub fn token(&self) -> &str {
        &self.session_id
    }

    /// Rebuild a handle from a token previously returned by [`Self::token`].
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            session_id: token.into(),
        }
    }
}

impl fmt::Debug for SessionKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyHandle")
            .field("session_id", &"[REDACTED]")
            .finish()
    }
}

struct CachedKey {
    user_id: UserId,
    key: Arc<DataKey>,
    expires_at: Instant,
}

/// Shared session-key arena. Cloning is cheap and every clone sees the same
/// sessions.
#[derive(Clone)]
pub struct SessionKeyCache {
    entries: Arc<RwLock<HashMap<String, CachedKey>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl fmt::Debug for SessionKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyCache")
            .field("ttl", &self.ttl)
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}

impl SessionKeyCache {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(Duration::from_secs(config.ttl_secs), config.max_sessions)
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Park `key` for `user_id` and return a fresh handle.
    ///
    /// When the cache is full, expired entries are dropped first, then the
    /// entry closest to expiry.
    pub(crate) async fn insert(
        &self,
        user_id: UserId,
        key: DataKey,
    ) -> Result<SessionKeyHandle, LockboxError> {
        let session_id = random::token_hex(SESSION_ID_BYTES)?;
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_sessions {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        while entries.len() >= self.max_sessions {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                    tracing::debug!("session cache full, evicted oldest session");
                }
                None => break,
            }
        }

        entries.insert(
            session_id.clone(),
            CachedKey {
                user_id,
                key: Arc::new(key),
                expires_at: now + self.ttl,
            },
        );
        Ok(SessionKeyHandle { session_id })
    }

    /// Look up a live session. Unknown and expired sessions are
    /// [`LockboxError::Authentication`]; an expired entry is removed.
    pub(crate) async fn resolve(
        &self,
        handle: &SessionKeyHandle,
    ) -> Result<(UserId, Arc<DataKey>), LockboxError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(&handle.session_id) {
                None => return Err(LockboxError::Authentication),
                Some(entry) if entry.expires_at > now => {
                    return Ok((entry.user_id.clone(), Arc::clone(&entry.key)));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&handle.session_id)
            .is_some_and(|entry| entry.expires_at <= now)
        {
            entries.remove(&handle.session_id);
            tracing::debug!("session expired");
        }
        Err(LockboxError::Authentication)
    }

    /// End one session. Returns whether it existed.
    pub async fn revoke(&self, handle: &SessionKeyHandle) -> bool {
        self.entries
            .write()
            .await
            .remove(&handle.session_id)
            .is_some()
    }

    /// End every session of `user_id` other than `keep`. Returns how many
    /// were removed.
    pub(crate) async fn revoke_user_except(
        &self,
        user_id: &UserId,
        keep: &SessionKeyHandle,
    ) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|id, entry| &entry.user_id != user_id || id == &keep.session_id);
        before - entries.len()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of cached sessions, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn key() -> DataKey {
        DataKey::from_bytes(random::array().unwrap())
    }

    #[tokio::test]
    async fn insert_then_resolve() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let handle = cache.insert(UserId::from("u1"), key()).await.unwrap();

        let (user_id, _) = cache.resolve(&handle).await.unwrap();
        assert_eq!(user_id, UserId::from("u1"));
        assert_eq!(handle.token().len(), SESSION_ID_BYTES * 2);
    }

    #[tokio::test]
    async fn unknown_handle_is_authentication_error() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let result = cache.resolve(&SessionKeyHandle::from_token("nope")).await;
        assert!(matches!(result, Err(LockboxError::Authentication)));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_is_rejected_and_removed() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let handle = cache.insert(UserId::from("u1"), key()).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(matches!(
            cache.resolve(&handle).await,
            Err(LockboxError::Authentication)
        ));
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_keeps_live_sessions() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        cache.insert(UserId::from("u1"), key()).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let live = cache.insert(UserId::from("u2"), key()).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.resolve(&live).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn full_cache_evicts_oldest() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 2);
        let first = cache.insert(UserId::from("u1"), key()).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = cache.insert(UserId::from("u2"), key()).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let third = cache.insert(UserId::from("u3"), key()).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert!(cache.resolve(&first).await.is_err());
        assert!(cache.resolve(&second).await.is_ok());
        assert!(cache.resolve(&third).await.is_ok());
        assert!(logs_contain("evicted oldest session"));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let handle = cache.insert(UserId::from("u1"), key()).await.unwrap();

        assert!(cache.revoke(&handle).await);
        assert!(!cache.revoke(&handle).await);
        assert!(cache.resolve(&handle).await.is_err());
    }

    #[tokio::test]
    async fn revoke_user_except_keeps_caller_and_other_users() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let alice = UserId::from("alice");
        let keep = cache.insert(alice.clone(), key()).await.unwrap();
        let other = cache.insert(alice.clone(), key()).await.unwrap();
        let bob = cache.insert(UserId::from("bob"), key()).await.unwrap();

        assert_eq!(cache.revoke_user_except(&alice, &keep).await, 1);
        assert!(cache.resolve(&keep).await.is_ok());
        assert!(cache.resolve(&other).await.is_err());
        assert!(cache.resolve(&bob).await.is_ok());
    }

    #[tokio::test]
    async fn clones_share_sessions() {
        let cache = SessionKeyCache::with_limits(Duration::from_secs(60), 8);
        let clone = cache.clone();
        let handle = cache.insert(UserId::from("u1"), key()).await.unwrap();
        assert!(clone.resolve(&handle).await.is_ok());
    }

    #[test]
    fn handle_debug_is_redacted() {
        let handle = SessionKeyHandle::from_token("deadbeef");
        assert!(!format!("{handle:?}").contains("deadbeef"));
    }
}
