// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend contract traits the reconciliation engine is built against.

pub mod audit_log;
pub mod embedder;
pub mod graph;
pub mod language_model;
pub mod telemetry;
pub mod vector_index;

pub use audit_log::AuditLog;
pub use embedder::Embedder;
pub use graph::{GraphStore, NoopGraph};
pub use language_model::LanguageModel;
pub use telemetry::{NoopTelemetry, TelemetrySink};
pub use vector_index::VectorIndex;
