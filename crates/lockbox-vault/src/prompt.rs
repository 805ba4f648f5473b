// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition via TTY prompt or environment variable.

use lockbox_core::LockboxError;
use secrecy::SecretString;

/// Environment variable holding the login password for non-interactive use.
pub const PASSWORD_ENV_VAR: &str = "LOCKBOX_PASSWORD";

/// Environment variable holding the replacement password for `passwd`.
pub const NEW_PASSWORD_ENV_VAR: &str = "LOCKBOX_NEW_PASSWORD";

/// Environment variable holding a record's password for `add` and `edit`.
pub const RECORD_PASSWORD_ENV_VAR: &str = "LOCKBOX_RECORD_PASSWORD";

fn from_env(env_var: &str) -> Option<SecretString> {
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn prompt(label: &str) -> Result<String, LockboxError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map_err(|e| LockboxError::Internal(format!("failed to read password: {e}")))
}

fn no_source(env_var: &str) -> LockboxError {
    LockboxError::Validation(format!(
        "no password provided; set {env_var} or run interactively"
    ))
}

/// Read a secret from `env_var`, or prompt for it on the terminal.
///
/// An empty value is rejected.
pub fn read_secret(env_var: &str, label: &str) -> Result<SecretString, LockboxError> {
    if let Some(secret) = from_env(env_var) {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let value = prompt(label)?;
        if value.is_empty() {
            return Err(LockboxError::Validation("empty password not allowed".into()));
        }
        return Ok(SecretString::from(value));
    }

    Err(no_source(env_var))
}

/// Like [`read_secret`], but an interactive entry must be typed twice.
pub fn read_secret_with_confirm(env_var: &str, label: &str) -> Result<SecretString, LockboxError> {
    if let Some(secret) = from_env(env_var) {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let first = zeroize::Zeroizing::new(prompt(label)?);
        let second = zeroize::Zeroizing::new(prompt(&format!("Confirm {}", label.to_lowercase()))?);
        if *first != *second {
            return Err(LockboxError::Validation("passwords do not match".into()));
        }
        if first.is_empty() {
            return Err(LockboxError::Validation("empty password not allowed".into()));
        }
        return Ok(SecretString::from(first.as_str()));
    }

    Err(no_source(env_var))
}

/// The login password.
pub fn read_password() -> Result<SecretString, LockboxError> {
    read_secret(PASSWORD_ENV_VAR, "Password")
}

/// A new login password, confirmed when typed interactively.
pub fn read_new_password(env_var: &str) -> Result<SecretString, LockboxError> {
    read_secret_with_confirm(env_var, "New password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn password_from_env_var() {
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::set_var(PASSWORD_ENV_VAR, "correcthorse") };
        let result = read_password();
        unsafe { std::env::remove_var(PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "correcthorse");
    }

    #[test]
    #[serial]
    fn new_password_from_env_var_skips_confirmation() {
        unsafe { std::env::set_var(NEW_PASSWORD_ENV_VAR, "batterystaple") };
        let result = read_new_password(NEW_PASSWORD_ENV_VAR);
        unsafe { std::env::remove_var(NEW_PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "batterystaple");
    }

    #[test]
    #[serial]
    fn empty_env_var_is_rejected() {
        unsafe { std::env::set_var(PASSWORD_ENV_VAR, "") };
        // Under the test harness stdin is not a terminal.
        let result = read_password();
        unsafe { std::env::remove_var(PASSWORD_ENV_VAR) };

        assert!(result.is_err());
    }
}
