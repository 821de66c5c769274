// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit log backend contract.

use async_trait::async_trait;

use crate::error::EngramError;
use crate::types::{AuditEntry, NewAuditEntry};

/// Append-only history of every memory mutation.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one immutable entry.
    async fn append(&self, entry: NewAuditEntry) -> Result<(), EngramError>;

    /// Returns all entries for a memory id, ordered by `updated_at`
    /// ascending.
    async fn history_for(&self, memory_id: &str) -> Result<Vec<AuditEntry>, EngramError>;

    /// Drops the entire log. Irreversible.
    async fn reset(&self) -> Result<(), EngramError>;
}
