// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedder producing stable vectors without external calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use engram_core::{Embedder, EngramError};

/// Dimensionality of mock embeddings.
pub const MOCK_EMBEDDING_DIM: usize = 8;

/// Embedder deriving a deterministic vector from the text bytes.
///
/// The same text always embeds to the same vector, and explicit overrides
/// can pin chosen texts to chosen vectors for controlled similarity. A
/// call counter lets tests assert the engine's embedding cache is hit.
pub struct MockEmbedder {
    overrides: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pins a text to a fixed vector.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.overrides.lock().unwrap().insert(text.into(), vector);
        self
    }

    /// Number of embed calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn derive(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_EMBEDDING_DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % MOCK_EMBEDDING_DIM] += f32::from(byte) / 255.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(vector) = self.overrides.lock().unwrap().get(text) {
            return Ok(vector.clone());
        }
        Ok(Self::derive(text))
    }
}
