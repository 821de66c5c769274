// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History table schema verification and in-place legacy migration.
//!
//! On open, the on-disk column set is compared against the expected
//! schema. A legacy table (`prev_value`/`new_value`/`timestamp` columns)
//! is renamed, re-created under the current schema, migrated row by row
//! via column mapping, and dropped -- all inside one transaction, so a
//! half-migrated table can never be left behind.

use std::collections::BTreeMap;

use rusqlite::OptionalExtension;

/// Current history table schema.
pub(crate) const CREATE_HISTORY_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS history (
  id TEXT PRIMARY KEY,
  memory_id TEXT,
  old_memory TEXT,
  new_memory TEXT,
  event TEXT,
  created_at DATETIME,
  updated_at DATETIME,
  is_deleted INTEGER
)";

/// Column mapping from the legacy layout: `prev_value` -> `old_memory`,
/// `new_value` -> `new_memory`, `timestamp` -> both timestamps.
const MIGRATE_LEGACY_ROWS: &str = "\
INSERT INTO history (id, memory_id, old_memory, new_memory, event, created_at, updated_at, is_deleted)
SELECT id, memory_id, prev_value, new_value, event, timestamp, timestamp, is_deleted
FROM history_legacy";

fn expected_columns() -> BTreeMap<String, String> {
    [
        ("id", "TEXT"),
        ("memory_id", "TEXT"),
        ("old_memory", "TEXT"),
        ("new_memory", "TEXT"),
        ("event", "TEXT"),
        ("created_at", "DATETIME"),
        ("updated_at", "DATETIME"),
        ("is_deleted", "INTEGER"),
    ]
    .into_iter()
    .map(|(name, ty)| (name.to_string(), ty.to_string()))
    .collect()
}

fn table_columns(conn: &rusqlite::Connection) -> rusqlite::Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(history)")?;
    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let ty: String = row.get(2)?;
            Ok((name, ty))
        })?
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(columns)
}

/// Verifies the history table schema, migrating a legacy table in place.
///
/// Runs in a single transaction; either the table ends up in the current
/// schema with all legacy rows carried over, or nothing changes. A second
/// run against the current schema is a no-op.
pub(crate) fn ensure_schema(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    let table_exists: Option<String> = tx
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='history'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if table_exists.is_some() && table_columns(&tx)? != expected_columns() {
        tx.execute("ALTER TABLE history RENAME TO history_legacy", [])?;
        tx.execute(CREATE_HISTORY_TABLE, [])?;
        tx.execute(MIGRATE_LEGACY_ROWS, [])?;
        tx.execute("DROP TABLE history_legacy", [])?;
    }

    tx.execute(CREATE_HISTORY_TABLE, [])?;
    tx.commit()
}
