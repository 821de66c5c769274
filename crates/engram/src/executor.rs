// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies classified decisions to the vector index and the audit trail.
//!
//! Decisions within one batch execute independently and may interleave;
//! each is independently fallible, and a failed decision is dropped from
//! the result without aborting its siblings. Partial application is
//! accepted: the caller sees only the mutations that landed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use engram_core::types::{
    content_hash, utc_now, AppliedMutation, MemoryEvent, MemoryScope, MetadataMap, NewAuditEntry,
    TelemetryEvent, VectorPayload,
};
use engram_core::{AuditLog, Embedder, EngramError, TelemetrySink, VectorIndex};

use crate::reconciler::Decision;

pub(crate) struct MutationExecutor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    history: Arc<dyn AuditLog>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl MutationExecutor {
    pub(crate) fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        history: Arc<dyn AuditLog>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            embedder,
            index,
            history,
            telemetry,
        }
    }

    /// Executes every decision, aggregating the successes.
    ///
    /// Failures are logged and dropped; callers needing visibility into
    /// skipped decisions inspect the logs.
    pub(crate) async fn execute(
        &self,
        decisions: Vec<Decision>,
        embeddings: &HashMap<String, Vec<f32>>,
        metadata: &MetadataMap,
        scope: &MemoryScope,
    ) -> Vec<AppliedMutation> {
        let outcomes = join_all(
            decisions
                .into_iter()
                .map(|decision| self.apply(decision, embeddings, metadata, scope)),
        )
        .await;

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(applied) => applied,
                Err(e) => {
                    warn!(error = %e, "memory mutation failed, dropping decision");
                    None
                }
            })
            .collect()
    }

    async fn apply(
        &self,
        decision: Decision,
        embeddings: &HashMap<String, Vec<f32>>,
        metadata: &MetadataMap,
        scope: &MemoryScope,
    ) -> Result<Option<AppliedMutation>, EngramError> {
        match decision {
            Decision::Add { text } => self
                .create_memory(&text, embeddings, metadata, scope)
                .await
                .map(Some),
            Decision::Update { id, text, old_text } => self
                .update_memory(&id, &text, embeddings, Some(metadata), old_text)
                .await
                .map(Some),
            Decision::Delete { id, text } => {
                Ok(self.delete_memory(&id).await?.map(|_previous| AppliedMutation {
                    id,
                    text,
                    event: MemoryEvent::Delete,
                    previous_text: None,
                }))
            }
        }
    }

    /// Inserts a new memory record and its ADD audit entry.
    ///
    /// Reuses the retrieval stage's embedding for this text when cached.
    pub(crate) async fn create_memory(
        &self,
        text: &str,
        embeddings: &HashMap<String, Vec<f32>>,
        metadata: &MetadataMap,
        scope: &MemoryScope,
    ) -> Result<AppliedMutation, EngramError> {
        let id = Uuid::new_v4().to_string();
        debug!(memory_id = %id, "creating memory");

        let embedding = match embeddings.get(text) {
            Some(cached) => cached.clone(),
            None => self.embedder.embed(text).await?,
        };
        let created_at = utc_now();
        let payload = VectorPayload {
            data: text.to_string(),
            hash: content_hash(text),
            created_at: created_at.clone(),
            updated_at: None,
            user_id: scope.user_id.clone(),
            agent_id: scope.agent_id.clone(),
            run_id: scope.run_id.clone(),
            metadata: metadata.clone(),
        };

        self.index
            .insert(vec![embedding], vec![id.clone()], vec![payload])
            .await?;
        self.history
            .append(NewAuditEntry {
                memory_id: id.clone(),
                old_memory: String::new(),
                new_memory: text.to_string(),
                event: MemoryEvent::Add,
                created_at: Some(created_at),
                updated_at: None,
                is_deleted: false,
            })
            .await?;
        self.telemetry
            .record(TelemetryEvent::new("memory.create").with("memory_id", id.clone()));

        Ok(AppliedMutation {
            id,
            text: text.to_string(),
            event: MemoryEvent::Add,
            previous_text: None,
        })
    }

    /// Writes through a text change, preserving the record's creation
    /// time and ownership scope.
    ///
    /// `metadata: None` keeps the record's existing metadata;
    /// `reported_old` is the reconciler's view of the superseded text,
    /// echoed to the caller while the audit entry records the actual one.
    pub(crate) async fn update_memory(
        &self,
        id: &str,
        text: &str,
        embeddings: &HashMap<String, Vec<f32>>,
        metadata: Option<&MetadataMap>,
        reported_old: Option<String>,
    ) -> Result<AppliedMutation, EngramError> {
        let existing = self
            .index
            .get(id)
            .await?
            .ok_or_else(|| EngramError::NotFound { id: id.to_string() })?;
        debug!(memory_id = %id, "updating memory");

        let previous_text = existing.payload.data.clone();
        let created_at = existing.payload.created_at.clone();
        let updated_at = utc_now();
        let payload = VectorPayload {
            data: text.to_string(),
            hash: content_hash(text),
            created_at: created_at.clone(),
            updated_at: Some(updated_at.clone()),
            user_id: existing.payload.user_id.clone(),
            agent_id: existing.payload.agent_id.clone(),
            run_id: existing.payload.run_id.clone(),
            metadata: metadata
                .cloned()
                .unwrap_or_else(|| existing.payload.metadata.clone()),
        };

        let embedding = match embeddings.get(text) {
            Some(cached) => cached.clone(),
            None => self.embedder.embed(text).await?,
        };

        self.index.update(id, embedding, payload).await?;
        self.history
            .append(NewAuditEntry {
                memory_id: id.to_string(),
                old_memory: previous_text.clone(),
                new_memory: text.to_string(),
                event: MemoryEvent::Update,
                created_at: Some(created_at),
                updated_at: Some(updated_at),
                is_deleted: false,
            })
            .await?;
        self.telemetry
            .record(TelemetryEvent::new("memory.update").with("memory_id", id.to_string()));

        Ok(AppliedMutation {
            id: id.to_string(),
            text: text.to_string(),
            event: MemoryEvent::Update,
            previous_text: Some(reported_old.unwrap_or(previous_text)),
        })
    }

    /// Removes a record with its DELETE audit entry. Deleting an absent
    /// id is a silent no-op; returns the prior text when a record was
    /// actually removed.
    pub(crate) async fn delete_memory(&self, id: &str) -> Result<Option<String>, EngramError> {
        let Some(existing) = self.index.get(id).await? else {
            debug!(memory_id = %id, "delete of absent memory is a no-op");
            return Ok(None);
        };
        debug!(memory_id = %id, "deleting memory");

        let previous_text = existing.payload.data;
        self.index.delete(id).await?;
        self.history
            .append(NewAuditEntry {
                memory_id: id.to_string(),
                old_memory: previous_text.clone(),
                new_memory: String::new(),
                event: MemoryEvent::Delete,
                created_at: None,
                updated_at: None,
                is_deleted: true,
            })
            .await?;
        self.telemetry
            .record(TelemetryEvent::new("memory.delete").with("memory_id", id.to_string()));

        Ok(Some(previous_text))
    }
}
