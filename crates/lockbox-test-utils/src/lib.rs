// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lockbox integration tests.
//!
//! Provides in-memory stores and a harness that wires a complete
//! [`lockbox_vault::VaultCore`] with fast key-derivation settings.
//!
//! # Components
//!
//! - [`MemoryIdentityStore`] / [`MemoryRecordStore`] - map-backed stores with fault injection
//! - [`TestHarness`] - a vault over memory or temp-file SQLite storage

pub mod harness;
pub mod memory;

pub use harness::{TestHarness, test_config};
pub use memory::{MemoryIdentityStore, MemoryRecordStore};
