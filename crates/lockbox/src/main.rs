// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a password vault with per-user envelope encryption.
//!
//! This is the binary entry point for the `lockbox` command.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lockbox_config::LockboxConfig;
use lockbox_core::LockboxError;
use lockbox_storage::{Database, SqliteIdentityStore, SqliteRecordStore};
use lockbox_vault::{SessionKeyCache, VaultCore};

/// Lockbox - a password vault with per-user envelope encryption.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account. The password is read from LOCKBOX_NEW_PASSWORD or
    /// prompted for twice.
    Signup { identity: String },
    /// Change an account's password.
    Passwd { identity: String },
    /// Store a new record. The record password is read from
    /// LOCKBOX_RECORD_PASSWORD or prompted for unless --generate is given.
    Add {
        identity: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Generate the record password, optionally with the given length.
        #[arg(long, value_name = "LENGTH")]
        generate: Option<Option<usize>>,
    },
    /// List records, most recently updated first.
    List {
        identity: String,
        /// Show passwords instead of a mask.
        #[arg(long)]
        reveal: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one record with its secrets.
    Show {
        identity: String,
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Change a record. Omitted fields keep their current value; an empty
    /// --url or --notes clears the field.
    Edit {
        identity: String,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Read a new record password (LOCKBOX_RECORD_PASSWORD or prompt).
        #[arg(long, conflicts_with = "generate")]
        password: bool,
        /// Replace the record password with a generated one.
        #[arg(long, value_name = "LENGTH")]
        generate: Option<Option<usize>>,
    },
    /// Delete a record.
    Rm { identity: String, id: String },
    /// Print a random password.
    Generate {
        #[arg(long)]
        length: Option<usize>,
        #[arg(long)]
        no_numbers: bool,
        #[arg(long)]
        no_symbols: bool,
        #[arg(long)]
        allow_look_alikes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => lockbox_config::load_and_validate_path(path),
        None => lockbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config).await {
        if e.is_transient() {
            tracing::error!(error = %e, "command failed");
        } else {
            tracing::debug!(error = %e, "command failed");
        }
        eprintln!("lockbox: {}", e.public_message());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &LockboxConfig) -> Result<(), LockboxError> {
    if let Commands::Generate {
        length,
        no_numbers,
        no_symbols,
        allow_look_alikes,
    } = command
    {
        let options = commands::generator_options(no_numbers, no_symbols, allow_look_alikes);
        return commands::generate(config, length, &options);
    }

    let db = Database::from_config(&config.storage).await?;
    let vault = VaultCore::new(
        Arc::new(SqliteIdentityStore::new(db.clone())),
        Arc::new(SqliteRecordStore::new(db.clone())),
        SessionKeyCache::new(&config.session),
        config,
    )?;

    let result = match command {
        Commands::Signup { identity } => commands::signup(&vault, &identity).await,
        Commands::Passwd { identity } => commands::passwd(&vault, &identity).await,
        Commands::Add {
            identity,
            title,
            username,
            url,
            notes,
            generate,
        } => {
            let draft = commands::Draft {
                title,
                username,
                url,
                notes,
            };
            commands::add(&vault, &identity, draft, generate).await
        }
        Commands::List {
            identity,
            reveal,
            json,
        } => commands::list(&vault, &identity, reveal, json).await,
        Commands::Show { identity, id, json } => {
            commands::show(&vault, &identity, &id, json).await
        }
        Commands::Edit {
            identity,
            id,
            title,
            username,
            url,
            notes,
            password,
            generate,
        } => {
            let edit = commands::Edit {
                title,
                username,
                url,
                notes,
                new_password: commands::PasswordSource::from_flags(password, generate),
            };
            commands::edit(&vault, &identity, &id, edit).await
        }
        Commands::Rm { identity, id } => commands::remove(&vault, &identity, &id).await,
        Commands::Generate { .. } => Ok(()),
    };

    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "failed to close database");
    }
    result
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lockbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flag_accepts_optional_length() {
        let cli = Cli::parse_from(["lockbox", "add", "alice", "--title", "Bank", "--generate"]);
        match cli.command {
            Commands::Add { generate, .. } => assert_eq!(generate, Some(None)),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from([
            "lockbox", "add", "alice", "--title", "Bank", "--generate", "24",
        ]);
        match cli.command {
            Commands::Add { generate, .. } => assert_eq!(generate, Some(Some(24))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn edit_password_and_generate_conflict() {
        let result = Cli::try_parse_from([
            "lockbox",
            "edit",
            "alice",
            "some-id",
            "--password",
            "--generate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let config = lockbox_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.logging.level, "info");
    }
}
