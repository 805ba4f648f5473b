// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lockbox.toml` > `~/.config/lockbox/lockbox.toml` > `/etc/lockbox/lockbox.toml`
//! with environment variable overrides via `LOCKBOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LockboxConfig;

/// Config sections that may be overridden from the environment.
///
/// Anything else carrying the `LOCKBOX_` prefix (such as `LOCKBOX_PASSWORD`)
/// is not configuration and is ignored here.
const ENV_SECTIONS: &[&str] = &["vault", "hasher", "generator", "session", "storage", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lockbox/lockbox.toml` (system-wide)
/// 3. `~/.config/lockbox/lockbox.toml` (user XDG config)
/// 4. `./lockbox.toml` (local directory)
/// 5. `LOCKBOX_*` environment variables
pub fn load_config() -> Result<LockboxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LockboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LockboxConfig::default()))
        .merge(Toml::file("/etc/lockbox/lockbox.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lockbox/lockbox.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lockbox.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `LOCKBOX_VAULT_KDF_MEMORY_COST` maps to `vault.kdf_memory_cost`,
/// not `vault.kdf.memory.cost`.
fn env_provider() -> Env {
    Env::prefixed("LOCKBOX_")
        .filter(|key| {
            let key = key.as_str().to_ascii_lowercase();
            ENV_SECTIONS
                .iter()
                .any(|section| key.starts_with(&format!("{section}_")))
        })
        .map(|key| {
            let key = key.as_str().to_ascii_lowercase();
            let mapped = ENV_SECTIONS
                .iter()
                .find_map(|section| {
                    key.strip_prefix(&format!("{section}_"))
                        .map(|rest| format!("{section}.{rest}"))
                })
                .unwrap_or(key);
            mapped.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LOCKBOX_VAULT_KDF_ITERATIONS", "5");
            jail.set_env("LOCKBOX_SESSION_TTL_SECS", "120");
            jail.set_env("LOCKBOX_STORAGE_DATABASE_PATH", "/tmp/jail.db");

            let config = load_config()?;
            assert_eq!(config.vault.kdf_iterations, 5);
            assert_eq!(config.session.ttl_secs, 120);
            assert_eq!(config.storage.database_path, "/tmp/jail.db");
            Ok(())
        });
    }

    #[test]
    fn password_env_var_is_not_configuration() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LOCKBOX_PASSWORD", "correcthorse");

            let config = load_config()?;
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "lockbox.toml",
                r#"
[generator]
default_length = 24
"#,
            )?;

            let config = load_config()?;
            assert_eq!(config.generator.default_length, 24);
            assert_eq!(config.generator.max_length, 128);
            Ok(())
        });
    }
}
