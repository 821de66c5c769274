// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index backend contract.

use async_trait::async_trait;

use crate::error::EngramError;
use crate::types::{Filters, VectorPayload, VectorRecord};

/// A vector store holding the current state of every memory record.
///
/// The index is the sole owner of current-state records; the engine never
/// caches them. Filters are exact-match maps of payload keys to scalar
/// values. Read-your-writes consistency is assumed for operations issued
/// by the same process.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the backing collection if it does not exist.
    async fn create_collection(&self) -> Result<(), EngramError>;

    /// Inserts vectors with their ids and payloads. All three slices must
    /// be the same length.
    async fn insert(
        &self,
        vectors: Vec<Vec<f32>>,
        ids: Vec<String>,
        payloads: Vec<VectorPayload>,
    ) -> Result<(), EngramError>;

    /// Returns up to `limit` records nearest to the query vector,
    /// restricted to payloads matching `filters`, best first.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: &Filters,
    ) -> Result<Vec<VectorRecord>, EngramError>;

    /// Fetches a record by id.
    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, EngramError>;

    /// Replaces a record's vector and payload in place.
    async fn update(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: VectorPayload,
    ) -> Result<(), EngramError>;

    /// Removes a record by id.
    async fn delete(&self, id: &str) -> Result<(), EngramError>;

    /// Lists up to `limit` records matching `filters`, unranked.
    async fn list(&self, filters: &Filters, limit: usize) -> Result<Vec<VectorRecord>, EngramError>;

    /// Drops the entire collection.
    async fn delete_collection(&self) -> Result<(), EngramError>;
}
