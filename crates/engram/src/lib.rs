// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engram: a persistent semantic memory layer for conversational agents.
//!
//! The engine ingests natural-language exchanges, distills them into
//! atomic factual statements, reconciles those facts against previously
//! stored memories through an LLM classification protocol, and durably
//! records both the current memory state and its full change history.
//!
//! ## Pipeline
//!
//! `Memory::add` runs four strictly sequential stages against injected
//! backends, concurrently with a secondary graph-ingestion pipeline:
//!
//! 1. **Fact extraction**: one structured LLM call turns the
//!    conversation into atomic factual strings.
//! 2. **Candidate retrieval**: each fact is embedded and the nearest
//!    existing memories are fetched, scoped by ownership filters.
//! 3. **Reconciliation**: the LLM classifies each fact against the
//!    candidates as ADD, UPDATE, DELETE, or NONE, behind a
//!    label-remapping scheme that keeps real ids out of the model.
//! 4. **Mutation execution**: decisions are applied to the vector index
//!    and appended to the audit trail, each independently fallible.
//!
//! Backends (language model, embedder, vector index, audit log, graph
//! store, telemetry sink) are trait objects from `engram-core`; the
//! engine holds no hidden global state.

mod config;
mod dialect;
mod executor;
mod extractor;
mod memory;
mod prompts;
mod reconciler;
mod retriever;

pub use config::EngineConfig;
pub use memory::{AddOptions, Memory, MemoryConfig, SearchOptions};

// Re-export the contract surface so downstream crates can depend on
// `engram` alone.
pub use engram_core::{
    AppliedMutation, AuditEntry, AuditLog, Embedder, EngramError, Filters, GraphStore,
    LanguageModel, MemoryEvent, MemoryRecord, MemoryScope, Message, Messages, MetadataMap,
    MetadataValue, ModelCapability, NoopGraph, NoopTelemetry, Role, TelemetryEvent, TelemetrySink,
    ToolCall, ToolChoice, ToolDialect, ToolOutput, ToolSpec, VectorIndex, VectorPayload,
    VectorRecord,
};
