// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the vault.
//!
//! Both stores use `#[async_trait]` so they can be held as
//! `Arc<dyn ...>` and swapped for in-memory fakes in tests.

pub mod identity;
pub mod records;

pub use identity::IdentityStore;
pub use records::RecordStore;
