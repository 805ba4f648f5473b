// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end vault testing.
//!
//! `TestHarness` assembles a [`VaultCore`] over either the in-memory stores
//! or a temp-file SQLite database, using key-derivation costs low enough for
//! fast tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lockbox_config::LockboxConfig;
use lockbox_core::{IdentityStore, LockboxError, RecordStore};
use lockbox_storage::{Database, SqliteIdentityStore, SqliteRecordStore};
use lockbox_vault::{SessionKeyCache, SessionKeyHandle, VaultCore};

use crate::memory::{MemoryIdentityStore, MemoryRecordStore};

/// A configuration with minimal Argon2id costs. Not for production use.
pub fn test_config() -> LockboxConfig {
    let mut config = LockboxConfig::default();
    config.vault.kdf_memory_cost = 8192;
    config.vault.kdf_iterations = 1;
    config.vault.kdf_parallelism = 1;
    config.hasher.memory_cost = 8192;
    config.hasher.iterations = 1;
    config.hasher.parallelism = 1;
    config
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Memory,
    Sqlite,
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    backend: Backend,
    session_ttl: Option<Duration>,
    max_sessions: Option<usize>,
    config: LockboxConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            backend: Backend::Memory,
            session_ttl: None,
            max_sessions: None,
            config: test_config(),
        }
    }

    /// Persist to a temp-file SQLite database instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.backend = Backend::Sqlite;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = Some(max);
        self
    }

    /// Replace the whole configuration. Storage paths are still overridden.
    pub fn with_config(mut self, config: LockboxConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, LockboxError> {
        let mut config = self.config;
        if let Some(ttl) = self.session_ttl {
            config.session.ttl_secs = ttl.as_secs();
        }
        if let Some(max) = self.max_sessions {
            config.session.max_sessions = max;
        }

        let sessions = match self.session_ttl {
            Some(ttl) => SessionKeyCache::with_limits(ttl, config.session.max_sessions),
            None => SessionKeyCache::new(&config.session),
        };

        let (identities, records, backend) = match self.backend {
            Backend::Memory => {
                let identities = MemoryIdentityStore::new();
                let records = MemoryRecordStore::new();
                (
                    Arc::new(identities.clone()) as Arc<dyn IdentityStore>,
                    Arc::new(records.clone()) as Arc<dyn RecordStore>,
                    Storage::Memory {
                        identities,
                        records,
                    },
                )
            }
            Backend::Sqlite => {
                let temp_dir = tempfile::TempDir::new().map_err(LockboxError::storage)?;
                let db_path = temp_dir.path().join("lockbox.db");
                config.storage.database_path = db_path.to_string_lossy().to_string();
                let db = Database::from_config(&config.storage).await?;
                (
                    Arc::new(SqliteIdentityStore::new(db.clone())) as Arc<dyn IdentityStore>,
                    Arc::new(SqliteRecordStore::new(db.clone())) as Arc<dyn RecordStore>,
                    Storage::Sqlite {
                        db,
                        db_path,
                        _temp_dir: temp_dir,
                    },
                )
            }
        };

        let vault = VaultCore::new(identities, records, sessions, &config)?;
        Ok(TestHarness {
            vault: Arc::new(vault),
            storage: backend,
        })
    }
}

enum Storage {
    Memory {
        identities: MemoryIdentityStore,
        records: MemoryRecordStore,
    },
    Sqlite {
        db: Database,
        db_path: PathBuf,
        _temp_dir: tempfile::TempDir,
    },
}

/// A complete vault over test storage.
pub struct TestHarness {
    pub vault: Arc<VaultCore>,
    storage: Storage,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A vault over in-memory stores with default test settings.
    pub async fn new() -> Result<Self, LockboxError> {
        Self::builder().build().await
    }

    /// Register `identity` and open a session for it.
    pub async fn signup_and_login(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<SessionKeyHandle, LockboxError> {
        self.vault.create_user(identity, password).await?;
        self.vault.authenticate(identity, password).await
    }

    /// The in-memory identity store, when the harness uses one.
    pub fn memory_identities(&self) -> Option<&MemoryIdentityStore> {
        match &self.storage {
            Storage::Memory { identities, .. } => Some(identities),
            Storage::Sqlite { .. } => None,
        }
    }

    /// The in-memory record store, when the harness uses one.
    pub fn memory_records(&self) -> Option<&MemoryRecordStore> {
        match &self.storage {
            Storage::Memory { records, .. } => Some(records),
            Storage::Sqlite { .. } => None,
        }
    }

    /// The SQLite database, when the harness uses one.
    pub fn database(&self) -> Option<&Database> {
        match &self.storage {
            Storage::Sqlite { db, .. } => Some(db),
            Storage::Memory { .. } => None,
        }
    }

    /// Everything the backing store has persisted for records, as raw bytes.
    ///
    /// For SQLite this is the database file plus its write-ahead log.
    pub async fn persisted_bytes(&self) -> Result<Vec<u8>, LockboxError> {
        match &self.storage {
            Storage::Memory { records, .. } => Ok(records.persisted_bytes().await),
            Storage::Sqlite { db_path, .. } => {
                let mut bytes = std::fs::read(db_path).map_err(LockboxError::storage)?;
                let mut wal = db_path.clone().into_os_string();
                wal.push("-wal");
                if let Ok(log) = std::fs::read(&wal) {
                    bytes.extend_from_slice(&log);
                }
                Ok(bytes)
            }
        }
    }
}
