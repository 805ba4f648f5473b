// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as KDF cost floors and generator bound ordering.

use crate::diagnostic::ConfigError;
use crate::model::LockboxConfig;

/// Hard ceiling on generated password length.
pub const GENERATOR_LENGTH_CEILING: usize = 1024;

/// Lowest generator length the config may set as `min_length`.
pub const GENERATOR_LENGTH_FLOOR: usize = 8;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LockboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    // Key-encryption key derivation.
    if config.vault.kdf_memory_cost < 32768 {
        invalid(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            config.vault.kdf_memory_cost
        ));
    }
    if config.vault.kdf_iterations < 2 {
        invalid(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            config.vault.kdf_iterations
        ));
    }
    if config.vault.kdf_parallelism < 1 {
        invalid(format!(
            "vault.kdf_parallelism must be at least 1, got {}",
            config.vault.kdf_parallelism
        ));
    }

    // Login password hash.
    if config.hasher.memory_cost < 8192 {
        invalid(format!(
            "hasher.memory_cost must be at least 8192 (8 MiB), got {}",
            config.hasher.memory_cost
        ));
    }
    if config.hasher.iterations < 1 {
        invalid("hasher.iterations must be at least 1".to_string());
    }
    if config.hasher.parallelism < 1 {
        invalid("hasher.parallelism must be at least 1".to_string());
    }

    // Generator bounds: floor <= min <= default <= max <= ceiling.
    let generator = &config.generator;
    if generator.min_length < GENERATOR_LENGTH_FLOOR {
        invalid(format!(
            "generator.min_length must be at least {GENERATOR_LENGTH_FLOOR}, got {}",
            generator.min_length
        ));
    }
    if generator.max_length > GENERATOR_LENGTH_CEILING {
        invalid(format!(
            "generator.max_length must be at most {GENERATOR_LENGTH_CEILING}, got {}",
            generator.max_length
        ));
    }
    if generator.min_length > generator.max_length {
        invalid(format!(
            "generator.min_length ({}) must not exceed generator.max_length ({})",
            generator.min_length, generator.max_length
        ));
    }
    if generator.default_length < generator.min_length
        || generator.default_length > generator.max_length
    {
        invalid(format!(
            "generator.default_length ({}) must lie within {}..={}",
            generator.default_length, generator.min_length, generator.max_length
        ));
    }

    // Session cache.
    if config.session.ttl_secs == 0 {
        invalid("session.ttl_secs must be greater than 0".to_string());
    }
    if config.session.max_sessions == 0 {
        invalid("session.max_sessions must be greater than 0".to_string());
    }

    // Storage.
    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    // Logging.
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
