// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for `lockbox.toml`.
//!
//! Figment errors become [`ConfigError`]s pointing at the offending line,
//! with "did you mean" suggestions for misspelled keys and unit hints for
//! the vault, hasher, generator and session costs.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Key fragments that mean someone tried to put a credential in the file.
const SECRET_KEY_MARKERS: &[&str] = &["password", "passphrase", "secret", "master_key", "dek"];

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", section_label(section))]
    #[diagnostic(
        code(lockbox::config::unknown_key),
        help("{}", unknown_key_help(section, suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Enclosing table, empty for the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a lockbox setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A credential-looking key. Never echoes the value.
    #[error("`{key}` looks like a credential; lockbox never reads secrets from its config file")]
    #[diagnostic(
        code(lockbox::config::secret_in_config),
        help(
            "remove the line and rotate that password; supply it through LOCKBOX_PASSWORD or the prompt instead"
        )
    )]
    SecretInConfig {
        key: String,
        #[label("remove this")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(lockbox::config::invalid_type), help("{}", type_help(key, expected)))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A value that parsed but is out of range.
    #[error("validation error: {message}")]
    #[diagnostic(code(lockbox::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(lockbox::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(section: &str, suggestion: Option<&str>, valid_keys: &str) -> String {
    let noun = if section.is_empty() { "sections" } else { "keys" };
    match suggestion {
        Some(s) if section.is_empty() => format!("did you mean `[{s}]`? Valid {noun}: {valid_keys}"),
        Some(s) => format!("did you mean `{s}`? Valid {noun}: {valid_keys}"),
        None => format!("valid {noun}: {valid_keys}"),
    }
}

fn type_help(key: &str, expected: &str) -> String {
    match unit_hint(key) {
        Some(hint) => format!("expected {expected} ({hint})"),
        None => format!("expected {expected}"),
    }
}

/// What the number behind a dotted key path measures.
pub fn unit_hint(key: &str) -> Option<&'static str> {
    let leaf = key.rsplit('.').next().unwrap_or(key);
    match leaf {
        "kdf_memory_cost" | "memory_cost" => Some("Argon2 memory in KiB, e.g. 65536"),
        "kdf_iterations" | "iterations" => Some("Argon2 passes, at least 2"),
        "kdf_parallelism" | "parallelism" => Some("Argon2 lanes, at least 1"),
        "ttl_secs" => Some("session lifetime in seconds"),
        "max_sessions" => Some("number of concurrently unlocked sessions"),
        "min_length" | "max_length" | "default_length" => Some("password length in characters"),
        "wal_mode" => Some("true or false"),
        _ => None,
    }
}

/// Whether an unrecognized key name suggests a stored credential.
pub fn looks_like_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A figment error may hold several errors; each becomes its own diagnostic.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section = error.path.first().cloned().unwrap_or_default();
            match &error.kind {
                Kind::UnknownField(field, _) if looks_like_secret(field) => {
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::SecretInConfig {
                        key: field.clone(),
                        span,
                        src,
                    }
                }
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        section,
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Resolve the file an error came from and the span of `field` inside it.
fn locate(
    error: &figment::error::Error,
    section: &str,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline sources carry no file path; fall back to the only source given.
    let source = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    source
        .and_then(|(path, content)| {
            let offset = find_key_offset(content, section, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as a key inside `[section]` (or the top level
/// when `section` is empty).
///
/// Lines are walked in order while tracking the current table header, so a
/// key of the same name under another table is never matched. Comments are
/// skipped.
pub fn find_key_offset(content: &str, section: &str, field: &str) -> Option<usize> {
    let mut current = "";
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().unwrap_or("").trim();
        } else if !trimmed.starts_with('#')
            && current == section
            && let Some(after) = trimmed.strip_prefix(field)
            && matches!(after.trim_start().chars().next(), Some('='))
        {
            return Some(offset + indent);
        }

        offset += line.len();
    }

    // An unknown top-level table shows up as its header.
    if section.is_empty() {
        let header = format!("[{field}]");
        return content.find(&header).map(|pos| pos + 1);
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_close_key() {
        let valid = &["kdf_memory_cost", "kdf_iterations", "kdf_parallelism"];
        assert_eq!(
            suggest_key("kdf_iteratons", valid),
            Some("kdf_iterations".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["ttl_secs", "max_sessions"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn key_offset_respects_current_section() {
        let content = "[session]\niterations = 1\n\n[hasher]\n# iterations = 9\niterations = 2\n";
        let o = find_key_offset(content, "hasher", "iterations").unwrap();
        assert_eq!(&content[o..o + 14], "iterations = 2");
    }

    #[test]
    fn key_offset_missing_section() {
        let content = "[session]\nttl_secs = 1\n";
        assert_eq!(find_key_offset(content, "vault", "ttl_secs"), None);
    }

    #[test]
    fn key_offset_for_unknown_table() {
        let content = "[logging]\nlevel = \"info\"\n[telemetry]\nenabled = true\n";
        let o = find_key_offset(content, "", "telemetry").unwrap();
        assert_eq!(&content[o..o + 9], "telemetry");
    }

    #[test]
    fn credential_keys_are_recognized() {
        assert!(looks_like_secret("master_password"));
        assert!(looks_like_secret("Passphrase"));
        assert!(!looks_like_secret("kdf_iteratons"));
    }

    #[test]
    fn unit_hints_follow_the_leaf_key() {
        assert_eq!(
            type_help("session.ttl_secs", "u64"),
            "expected u64 (session lifetime in seconds)"
        );
        assert_eq!(type_help("logging.level", "a string"), "expected a string");
    }

    #[test]
    fn unknown_section_help_suggests_table() {
        let help = unknown_key_help("", Some("vault"), "vault, hasher");
        assert!(help.contains("`[vault]`"));
        assert!(help.contains("sections"));
    }
}
