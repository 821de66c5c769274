// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph memory backend contract.
//!
//! The graph pipeline runs alongside the vector pipeline in `add` but is
//! presently a stub surface; [`NoopGraph`] is the default implementation.

use async_trait::async_trait;

use crate::error::EngramError;
use crate::types::Filters;

/// Entity-relationship memory store fed by the secondary `add` pipeline.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Ingests conversation text (non-system turns, newline-joined).
    async fn add(&self, data: &str, filters: &Filters) -> Result<(), EngramError>;

    /// Searches graph relations for a query.
    async fn search(&self, query: &str, filters: &Filters) -> Result<(), EngramError>;

    /// Removes all relations within the given scope.
    async fn delete_all(&self, filters: &Filters) -> Result<(), EngramError>;
}

/// Graph backend that accepts everything and stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGraph;

#[async_trait]
impl GraphStore for NoopGraph {
    async fn add(&self, _data: &str, _filters: &Filters) -> Result<(), EngramError> {
        Ok(())
    }

    async fn search(&self, _query: &str, _filters: &Filters) -> Result<(), EngramError> {
        Ok(())
    }

    async fn delete_all(&self, _filters: &Filters) -> Result<(), EngramError> {
        Ok(())
    }
}
