// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lockbox password vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Lockbox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockboxConfig {
    /// Key-encryption key derivation settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Login password hashing settings.
    #[serde(default)]
    pub hasher: HasherConfig,

    /// Password generator bounds.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Unlocked-key session cache settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Argon2id parameters for deriving the key-encryption key from a password.
///
/// Applied to newly enrolled users and password changes. Existing users keep
/// the parameters recorded alongside their wrapped key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Argon2id parameters for the login password hash.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HasherConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB).
    #[serde(default = "default_hasher_memory_cost")]
    pub memory_cost: u32,

    /// Iteration count (default: 2).
    #[serde(default = "default_hasher_iterations")]
    pub iterations: u32,

    /// Parallelism lanes (default: 1).
    #[serde(default = "default_hasher_parallelism")]
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_hasher_memory_cost(),
            iterations: default_hasher_iterations(),
            parallelism: default_hasher_parallelism(),
        }
    }
}

fn default_hasher_memory_cost() -> u32 {
    19456
}

fn default_hasher_iterations() -> u32 {
    2
}

fn default_hasher_parallelism() -> u32 {
    1
}

/// Password generator bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Shortest password the generator will produce.
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Longest password the generator will produce.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Length used when the caller does not ask for one.
    #[serde(default = "default_length")]
    pub default_length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            default_length: default_length(),
        }
    }
}

fn default_min_length() -> usize {
    8
}

fn default_max_length() -> usize {
    128
}

fn default_length() -> usize {
    16
}

/// Lifetime of unlocked data-encryption keys held for authenticated sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds an unlocked key stays cached after login.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on concurrently cached keys.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    1024
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable SQLite WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("lockbox").join("lockbox.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("lockbox.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
