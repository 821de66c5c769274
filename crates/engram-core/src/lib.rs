// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Engram memory engine.
//!
//! This crate provides the backend contract traits, error taxonomy, and
//! domain types shared across the Engram workspace. The reconciliation
//! engine in the `engram` crate is written entirely against these
//! contracts; concrete language-model, embedding, and vector-index
//! adapters implement them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EngramError;
pub use traits::{
    AuditLog, Embedder, GraphStore, LanguageModel, NoopGraph, NoopTelemetry, TelemetrySink,
    VectorIndex,
};
pub use types::{
    AppliedMutation, AuditEntry, Filters, MemoryEvent, MemoryRecord, MemoryScope, Message,
    Messages, MetadataMap, MetadataValue, ModelCapability, NewAuditEntry, Role, TelemetryEvent,
    ToolCall, ToolChoice, ToolDialect, ToolOutput, ToolSpec, VectorPayload, VectorRecord,
};
