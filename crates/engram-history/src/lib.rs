// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Engram audit trail.
//!
//! Provides [`HistoryStore`], an append-only, keyed-by-memory-id log of
//! every mutation, with schema verification and in-place migration of the
//! legacy column layout on open.

mod schema;
mod store;

pub use store::HistoryStore;
