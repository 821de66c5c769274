// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The public memory surface.
//!
//! `Memory` sequences the pipeline stages (extract, retrieve, reconcile,
//! execute) for `add` and exposes the direct record operations. The
//! vector pipeline and the graph pipeline run concurrently per `add`
//! call; a failure in one never prevents the other from completing.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use engram_core::types::{
    has_scope_key, sanitize_metadata, AppliedMutation, AuditEntry, Filters, MemoryRecord,
    MemoryScope, Message, Messages, MetadataMap, TelemetryEvent,
};
use engram_core::{
    AuditLog, Embedder, EngramError, GraphStore, LanguageModel, NoopGraph, NoopTelemetry,
    TelemetrySink, VectorIndex,
};

use crate::config::EngineConfig;
use crate::executor::MutationExecutor;
use crate::extractor::FactExtractor;
use crate::prompts;
use crate::reconciler::Reconciler;
use crate::retriever::CandidateRetriever;

/// Backends and tuning for a [`Memory`] instance.
///
/// The graph store and telemetry sink are optional and default to no-op
/// implementations.
pub struct MemoryConfig {
    pub language_model: Arc<dyn LanguageModel>,
    pub embedder: Arc<dyn Embedder>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub audit_log: Arc<dyn AuditLog>,
    pub graph: Option<Arc<dyn GraphStore>>,
    pub telemetry: Option<Arc<dyn TelemetrySink>>,
    pub engine: EngineConfig,
}

/// Options for [`Memory::add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub scope: MemoryScope,
    pub metadata: MetadataMap,
    pub filters: Filters,
}

impl AddOptions {
    pub fn scoped(scope: MemoryScope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }
}

/// Options for [`Memory::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub scope: MemoryScope,
    pub filters: Filters,
    pub limit: Option<usize>,
}

impl SearchOptions {
    pub fn scoped(scope: MemoryScope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }
}

/// The persistent semantic memory layer.
pub struct Memory {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    history: Arc<dyn AuditLog>,
    graph: Arc<dyn GraphStore>,
    telemetry: Arc<dyn TelemetrySink>,
    extractor: FactExtractor,
    retriever: CandidateRetriever,
    reconciler: Reconciler,
    executor: MutationExecutor,
    result_limit: usize,
}

fn filter_keys(filters: &Filters) -> String {
    filters.keys().cloned().collect::<Vec<_>>().join(",")
}

fn require_scope(filters: &Filters) -> Result<(), EngramError> {
    if has_scope_key(filters) {
        Ok(())
    } else {
        Err(EngramError::Validation(
            "one of the filters user_id, agent_id or run_id is required".to_string(),
        ))
    }
}

impl Memory {
    pub fn new(config: MemoryConfig) -> Self {
        let graph = config.graph.unwrap_or_else(|| Arc::new(NoopGraph));
        let telemetry = config
            .telemetry
            .unwrap_or_else(|| Arc::new(NoopTelemetry));
        let extractor = FactExtractor::new(
            config.language_model.clone(),
            config.engine.custom_extraction_prompt.clone(),
        );
        let retriever = CandidateRetriever::new(
            config.embedder.clone(),
            config.vector_index.clone(),
            config.engine.candidate_limit,
        );
        let reconciler = Reconciler::new(config.language_model.clone());
        let executor = MutationExecutor::new(
            config.embedder.clone(),
            config.vector_index.clone(),
            config.audit_log.clone(),
            telemetry.clone(),
        );
        telemetry.record(TelemetryEvent::new("memory.init"));
        Self {
            embedder: config.embedder,
            index: config.vector_index,
            history: config.audit_log,
            graph,
            telemetry,
            extractor,
            retriever,
            reconciler,
            executor,
            result_limit: config.engine.result_limit,
        }
    }

    /// Ingests a conversation: extracts facts, reconciles them against
    /// stored memories, and applies the resulting mutations.
    ///
    /// Requires at least one ownership-scope key, via `options.scope` or
    /// directly in `options.filters`. Returns only the mutations that
    /// were applied; skipped decisions are logged.
    pub async fn add(
        &self,
        messages: impl Into<Messages>,
        options: AddOptions,
    ) -> Result<Vec<AppliedMutation>, EngramError> {
        let Messages(turns) = messages.into();
        let mut filters = options.filters;
        options.scope.apply_to(&mut filters);
        require_scope(&filters)?;
        let scope = MemoryScope::from_filters(&filters);
        let metadata = sanitize_metadata(options.metadata);

        self.telemetry
            .record(TelemetryEvent::new("memory.add").with("keys", filter_keys(&filters)));

        let (vector_result, graph_result) = tokio::join!(
            self.add_to_vector_store(&turns, &metadata, &filters, &scope),
            self.add_to_graph(&turns, &filters),
        );
        if let Err(e) = graph_result {
            warn!(error = %e, "graph pipeline failed");
        }
        vector_result
    }

    async fn add_to_vector_store(
        &self,
        turns: &[Message],
        metadata: &MetadataMap,
        filters: &Filters,
        scope: &MemoryScope,
    ) -> Result<Vec<AppliedMutation>, EngramError> {
        let facts = self.extractor.extract(turns).await;
        if facts.is_empty() {
            debug!("no facts extracted, nothing to reconcile");
            return Ok(Vec::new());
        }

        let retrieval = self.retriever.retrieve(&facts, filters).await?;
        let decisions = self
            .reconciler
            .reconcile(&facts, &retrieval.candidates)
            .await?;
        Ok(self
            .executor
            .execute(decisions, &retrieval.embeddings, metadata, scope)
            .await)
    }

    async fn add_to_graph(&self, turns: &[Message], filters: &Filters) -> Result<(), EngramError> {
        let data = prompts::graph_payload(turns);
        if data.is_empty() {
            return Ok(());
        }
        self.graph.add(&data, filters).await
    }

    /// Fetches a single record by id, or `None` if absent.
    pub async fn get(&self, memory_id: &str) -> Result<Option<MemoryRecord>, EngramError> {
        self.telemetry
            .record(TelemetryEvent::new("memory.get").with("memory_id", memory_id.to_string()));
        Ok(self.index.get(memory_id).await?.map(Into::into))
    }

    /// Lists records, filtered by whichever scope keys are set.
    pub async fn get_all(
        &self,
        scope: &MemoryScope,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryRecord>, EngramError> {
        let mut filters = Filters::new();
        scope.apply_to(&mut filters);
        self.telemetry
            .record(TelemetryEvent::new("memory.get_all").with("keys", filter_keys(&filters)));
        let records = self
            .index
            .list(&filters, limit.unwrap_or(self.result_limit))
            .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Semantic search over the caller's scope. Embeds the query once
    /// and performs a single similarity search.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<MemoryRecord>, EngramError> {
        let mut filters = options.filters;
        options.scope.apply_to(&mut filters);
        require_scope(&filters)?;
        let limit = options.limit.unwrap_or(self.result_limit);

        self.telemetry.record(
            TelemetryEvent::new("memory.search")
                .with("keys", filter_keys(&filters))
                .with("limit", limit.to_string()),
        );

        let embedding = self.embedder.embed(query).await?;
        let records = self.index.search(&embedding, limit, &filters).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Replaces a record's text, recomputing its embedding and hash.
    /// Always audited as an UPDATE event.
    pub async fn update(
        &self,
        memory_id: &str,
        text: &str,
    ) -> Result<AppliedMutation, EngramError> {
        self.telemetry
            .record(TelemetryEvent::new("memory.update").with("memory_id", memory_id.to_string()));
        let mut embeddings = HashMap::new();
        embeddings.insert(text.to_string(), self.embedder.embed(text).await?);
        self.executor
            .update_memory(memory_id, text, &embeddings, None, None)
            .await
    }

    /// Removes a record with its audit entry; a no-op if absent.
    pub async fn delete(&self, memory_id: &str) -> Result<(), EngramError> {
        self.telemetry
            .record(TelemetryEvent::new("memory.delete").with("memory_id", memory_id.to_string()));
        self.executor.delete_memory(memory_id).await?;
        Ok(())
    }

    /// Removes every record in the given scope, one audit entry per
    /// record. Requires at least one scope key; use [`Memory::reset`]
    /// for a full teardown.
    pub async fn delete_all(&self, scope: &MemoryScope) -> Result<usize, EngramError> {
        if scope.is_empty() {
            return Err(EngramError::Validation(
                "at least one scope key is required to delete all memories; use reset() for a full teardown"
                    .to_string(),
            ));
        }
        let mut filters = Filters::new();
        scope.apply_to(&mut filters);
        self.telemetry
            .record(TelemetryEvent::new("memory.delete_all").with("keys", filter_keys(&filters)));

        let records = self.index.list(&filters, usize::MAX).await?;
        let mut deleted = 0usize;
        for record in &records {
            if self.executor.delete_memory(&record.id).await?.is_some() {
                deleted += 1;
            }
        }
        info!(count = deleted, "deleted memories in scope");
        Ok(deleted)
    }

    /// Returns the full change history of a record, oldest first.
    pub async fn history(&self, memory_id: &str) -> Result<Vec<AuditEntry>, EngramError> {
        self.telemetry
            .record(TelemetryEvent::new("memory.history").with("memory_id", memory_id.to_string()));
        self.history.history_for(memory_id).await
    }

    /// Drops the entire vector collection and the entire audit log.
    /// Irreversible and scope-less; intended for full teardown only.
    pub async fn reset(&self) -> Result<(), EngramError> {
        info!("resetting all memories");
        self.index.delete_collection().await?;
        self.history.reset().await?;
        self.telemetry.record(TelemetryEvent::new("memory.reset"));
        Ok(())
    }
}
