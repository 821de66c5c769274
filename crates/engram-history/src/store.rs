// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed implementation of the [`AuditLog`] contract.
//!
//! All access goes through tokio-rusqlite's single background connection,
//! so writes are serialized without in-process locking.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use engram_core::types::{utc_now, AuditEntry, MemoryEvent, NewAuditEntry};
use engram_core::{AuditLog, EngramError};

use crate::schema;

/// Helper to convert backend errors into EngramError::History.
fn history_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> EngramError {
    EngramError::History {
        source: Box::new(e),
    }
}

/// Append-only audit trail on SQLite.
///
/// The schema is verified (and a legacy table migrated) on open.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Opens (or creates) the history database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, EngramError> {
        let conn = Connection::open(path.as_ref().to_path_buf())
            .await
            .map_err(history_err)?;
        Self::init(conn).await
    }

    /// Opens an in-memory history database, private to this store.
    pub async fn open_in_memory() -> Result<Self, EngramError> {
        let conn = Connection::open_in_memory().await.map_err(history_err)?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, EngramError> {
        conn.call(|conn| {
            schema::ensure_schema(conn)?;
            Ok::<_, rusqlite::Error>(())
        })
        .await
        .map_err(history_err)?;
        debug!("history store opened");
        Ok(Self { conn })
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let event_text: String = row.get(4)?;
    let event = MemoryEvent::from_str(&event_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let is_deleted: i64 = row.get(7)?;
    Ok(AuditEntry {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        old_memory: row.get(2)?,
        new_memory: row.get(3)?,
        event,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        is_deleted: is_deleted != 0,
    })
}

#[async_trait]
impl AuditLog for HistoryStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<(), EngramError> {
        let id = Uuid::new_v4().to_string();
        let created_at = entry.created_at.unwrap_or_else(utc_now);
        let updated_at = entry.updated_at.unwrap_or_else(|| created_at.clone());
        let memory_id = entry.memory_id;
        let old_memory = entry.old_memory;
        let new_memory = entry.new_memory;
        let event = entry.event.to_string();
        let is_deleted = entry.is_deleted;

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO history (id, memory_id, old_memory, new_memory, event, created_at, updated_at, is_deleted) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        id,
                        memory_id,
                        old_memory,
                        new_memory,
                        event,
                        created_at,
                        updated_at,
                        is_deleted as i64,
                    ],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(history_err)
    }

    async fn history_for(&self, memory_id: &str) -> Result<Vec<AuditEntry>, EngramError> {
        let memory_id = memory_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, memory_id, old_memory, new_memory, event, created_at, updated_at, is_deleted FROM history WHERE memory_id = ?1 ORDER BY updated_at ASC",
                )?;
                let entries = stmt
                    .query_map(rusqlite::params![memory_id], row_to_entry)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, rusqlite::Error>(entries)
            })
            .await
            .map_err(history_err)
    }

    async fn reset(&self) -> Result<(), EngramError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("DROP TABLE IF EXISTS history")?;
                conn.execute(schema::CREATE_HISTORY_TABLE, [])?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(history_err)?;
        debug!("history store reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        memory_id: &str,
        old: &str,
        new: &str,
        event: MemoryEvent,
        updated_at: Option<&str>,
    ) -> NewAuditEntry {
        NewAuditEntry {
            memory_id: memory_id.to_string(),
            old_memory: old.to_string(),
            new_memory: new.to_string(),
            event,
            created_at: updated_at.map(str::to_string),
            updated_at: updated_at.map(str::to_string),
            is_deleted: matches!(event, MemoryEvent::Delete),
        }
    }

    #[tokio::test]
    async fn history_is_ordered_by_updated_at() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store
            .append(entry(
                "m1",
                "",
                "User is vegetarian",
                MemoryEvent::Add,
                Some("2026-01-01T00:00:00.000Z"),
            ))
            .await
            .unwrap();
        store
            .append(entry(
                "m1",
                "User eats fish",
                "",
                MemoryEvent::Delete,
                Some("2026-01-03T00:00:00.000Z"),
            ))
            .await
            .unwrap();
        store
            .append(entry(
                "m1",
                "User is vegetarian",
                "User eats fish",
                MemoryEvent::Update,
                Some("2026-01-02T00:00:00.000Z"),
            ))
            .await
            .unwrap();

        let history = store.history_for("m1").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].event, MemoryEvent::Add);
        assert_eq!(history[1].event, MemoryEvent::Update);
        assert_eq!(history[2].event, MemoryEvent::Delete);
        assert!(history[2].is_deleted);
    }

    #[tokio::test]
    async fn append_defaults_missing_timestamps() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store
            .append(NewAuditEntry {
                memory_id: "m1".into(),
                old_memory: "".into(),
                new_memory: "fact".into(),
                event: MemoryEvent::Add,
                created_at: None,
                updated_at: None,
                is_deleted: false,
            })
            .await
            .unwrap();

        let history = store.history_for("m1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].created_at.is_empty());
        assert_eq!(history[0].created_at, history[0].updated_at);
    }

    #[tokio::test]
    async fn memory_ids_are_isolated() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store
            .append(entry("m1", "", "a", MemoryEvent::Add, None))
            .await
            .unwrap();
        store
            .append(entry("m2", "", "b", MemoryEvent::Add, None))
            .await
            .unwrap();

        assert_eq!(store.history_for("m1").await.unwrap().len(), 1);
        assert_eq!(store.history_for("m2").await.unwrap().len(), 1);
        assert!(store.history_for("m3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_drops_all_entries() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store
            .append(entry("m1", "", "a", MemoryEvent::Add, None))
            .await
            .unwrap();
        store.reset().await.unwrap();

        assert!(store.history_for("m1").await.unwrap().is_empty());

        // Still writable after reset.
        store
            .append(entry("m1", "", "b", MemoryEvent::Add, None))
            .await
            .unwrap();
        assert_eq!(store.history_for("m1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_database_is_migrated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE history (
                   id TEXT PRIMARY KEY,
                   memory_id TEXT,
                   prev_value TEXT,
                   new_value TEXT,
                   event TEXT,
                   timestamp DATETIME,
                   is_deleted INTEGER
                 );
                 INSERT INTO history VALUES
                   ('h1', 'm1', '', 'User is vegetarian', 'ADD', '2025-06-01T00:00:00.000Z', 0);",
            )
            .unwrap();
        }

        let store = HistoryStore::open(&path).await.unwrap();
        let history = store.history_for("m1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_memory, "User is vegetarian");
        assert_eq!(history[0].created_at, "2025-06-01T00:00:00.000Z");
        assert_eq!(history[0].updated_at, history[0].created_at);
    }

    #[tokio::test]
    async fn reopening_migrated_database_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = HistoryStore::open(&path).await.unwrap();
            store
                .append(entry(
                    "m1",
                    "",
                    "fact",
                    MemoryEvent::Add,
                    Some("2026-01-01T00:00:00.000Z"),
                ))
                .await
                .unwrap();
        }

        // Second open sees the current schema: a no-op that keeps rows.
        let store = HistoryStore::open(&path).await.unwrap();
        let history = store.history_for("m1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_memory, "fact");
    }
}
