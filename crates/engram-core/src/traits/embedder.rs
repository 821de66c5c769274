// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backend contract.

use async_trait::async_trait;

use crate::error::EngramError;

/// Converts text into a vector for similarity search.
///
/// The engine imposes no normalization contract; distance semantics are
/// the vector index's responsibility.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError>;
}
