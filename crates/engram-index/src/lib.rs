// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded in-memory vector index.
//!
//! Implements the [`VectorIndex`] contract with cosine-similarity ranking
//! and exact-match scope filters. The default backend for tests and
//! single-process deployments; network vector stores plug in behind the
//! same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use engram_core::types::{Filters, VectorPayload, VectorRecord};
use engram_core::{EngramError, VectorIndex};

struct StoredVector {
    vector: Vec<f32>,
    payload: VectorPayload,
}

/// In-memory vector index keyed by record id.
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: RwLock<HashMap<String, StoredVector>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Mismatched dimensions score zero rather than panicking; such records
/// simply rank last.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn create_collection(&self) -> Result<(), EngramError> {
        Ok(())
    }

    async fn insert(
        &self,
        vectors: Vec<Vec<f32>>,
        ids: Vec<String>,
        payloads: Vec<VectorPayload>,
    ) -> Result<(), EngramError> {
        if vectors.len() != ids.len() || ids.len() != payloads.len() {
            return Err(EngramError::Index {
                message: format!(
                    "insert arity mismatch: {} vectors, {} ids, {} payloads",
                    vectors.len(),
                    ids.len(),
                    payloads.len()
                ),
                source: None,
            });
        }
        let mut records = self.records.write().await;
        for ((vector, id), payload) in vectors.into_iter().zip(ids).zip(payloads) {
            records.insert(id, StoredVector { vector, payload });
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: &Filters,
    ) -> Result<Vec<VectorRecord>, EngramError> {
        let records = self.records.read().await;
        let mut hits: Vec<VectorRecord> = records
            .iter()
            .filter(|(_, stored)| stored.payload.matches(filters))
            .map(|(id, stored)| VectorRecord {
                id: id.clone(),
                score: Some(cosine_similarity(query, &stored.vector)),
                payload: stored.payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, EngramError> {
        let records = self.records.read().await;
        Ok(records.get(id).map(|stored| VectorRecord {
            id: id.to_string(),
            score: None,
            payload: stored.payload.clone(),
        }))
    }

    async fn update(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: VectorPayload,
    ) -> Result<(), EngramError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(stored) => {
                stored.vector = vector;
                stored.payload = payload;
                Ok(())
            }
            None => Err(EngramError::NotFound { id: id.to_string() }),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), EngramError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn list(&self, filters: &Filters, limit: usize) -> Result<Vec<VectorRecord>, EngramError> {
        let records = self.records.read().await;
        let mut matches: Vec<VectorRecord> = records
            .iter()
            .filter(|(_, stored)| stored.payload.matches(filters))
            .map(|(id, stored)| VectorRecord {
                id: id.clone(),
                score: None,
                payload: stored.payload.clone(),
            })
            .collect();
        // Stable order for listings: creation time, then id.
        matches.sort_by(|a, b| {
            (&a.payload.created_at, &a.id).cmp(&(&b.payload.created_at, &b.id))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn delete_collection(&self) -> Result<(), EngramError> {
        self.records.write().await.clear();
        Ok(())
    }
}
