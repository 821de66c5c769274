// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Engram memory engine.

use thiserror::Error;

/// The primary error type used across all Engram backend traits and the
/// reconciliation pipeline.
#[derive(Debug, Error)]
pub enum EngramError {
    /// A required ownership-scope key (user/agent/run) was missing.
    /// Raised before any I/O; the operation has no side effects.
    #[error("validation error: {0}")]
    Validation(String),

    /// The target memory id does not exist in the vector index.
    #[error("memory not found: {id}")]
    NotFound { id: String },

    /// The reconciliation response referenced an identifier label that was
    /// never assigned. The offending decision is dropped, not the batch.
    #[error("reconciliation protocol violation: {0}")]
    Protocol(String),

    /// Fact extraction failed. Recovered locally with an empty fact list.
    #[error("fact extraction failed: {0}")]
    Extraction(String),

    /// Language-model backend errors (API failure, auth, malformed output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vector index backend errors.
    #[error("vector index error: {message}")]
    Index {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Audit history store errors (connection, query, migration).
    #[error("history store error: {source}")]
    History {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
