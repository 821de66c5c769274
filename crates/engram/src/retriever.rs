// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate retrieval: per-fact nearest-neighbor search over the vector
//! index, scoped by ownership filters.
//!
//! Facts are processed strictly in extraction order and retrieval is not
//! parallelized within a call; sequential execution keeps the load on the
//! external embedding API bounded. Computed embeddings are cached per
//! call so an ADD of the same fact text reuses the vector instead of
//! paying for a second embed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use engram_core::types::Filters;
use engram_core::{Embedder, EngramError, VectorIndex};

/// An existing memory retrieved as semantically close to a new fact.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub id: String,
    pub text: String,
}

/// Retrieval result: the flat candidate list plus the per-call embedding
/// cache keyed by fact text.
pub(crate) struct RetrievalOutput {
    pub candidates: Vec<Candidate>,
    pub embeddings: HashMap<String, Vec<f32>>,
}

pub(crate) struct CandidateRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    candidate_limit: usize,
}

impl CandidateRetriever {
    pub(crate) fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        candidate_limit: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            candidate_limit,
        }
    }

    /// Embeds each fact and accumulates its nearest existing memories.
    ///
    /// A failure on one fact is isolated: the fact contributes no
    /// candidates and the rest of the batch proceeds. Candidates are
    /// deduplicated by id so each memory gets exactly one label downstream.
    pub(crate) async fn retrieve(
        &self,
        facts: &[String],
        filters: &Filters,
    ) -> Result<RetrievalOutput, EngramError> {
        let mut candidates = Vec::new();
        let mut embeddings = HashMap::new();
        let mut seen = HashSet::new();

        for fact in facts {
            if let Err(e) = self
                .retrieve_one(fact, filters, &mut candidates, &mut embeddings, &mut seen)
                .await
            {
                warn!(fact = %fact, error = %e, "candidate retrieval failed for fact");
            }
        }

        Ok(RetrievalOutput {
            candidates,
            embeddings,
        })
    }

    async fn retrieve_one(
        &self,
        fact: &str,
        filters: &Filters,
        candidates: &mut Vec<Candidate>,
        embeddings: &mut HashMap<String, Vec<f32>>,
        seen: &mut HashSet<String>,
    ) -> Result<(), EngramError> {
        let embedding = if let Some(cached) = embeddings.get(fact).cloned() {
            cached
        } else {
            let embedding = self.embedder.embed(fact).await?;
            embeddings.insert(fact.to_string(), embedding.clone());
            embedding
        };

        let hits = self
            .index
            .search(&embedding, self.candidate_limit, filters)
            .await?;
        for hit in hits {
            if seen.insert(hit.id.clone()) {
                candidates.push(Candidate {
                    id: hit.id,
                    text: hit.payload.data,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::types::{content_hash, MetadataMap, VectorPayload};
    use engram_core::VectorIndex as _;
    use engram_index::MemoryVectorIndex;
    use engram_test_utils::MockEmbedder;

    fn payload(text: &str, user_id: &str) -> VectorPayload {
        VectorPayload {
            data: text.to_string(),
            hash: content_hash(text),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: None,
            user_id: Some(user_id.to_string()),
            agent_id: None,
            run_id: None,
            metadata: MetadataMap::new(),
        }
    }

    fn user_filter(user_id: &str) -> Filters {
        let mut filters = Filters::new();
        filters.insert("user_id".into(), user_id.into());
        filters
    }

    #[tokio::test]
    async fn accumulates_candidates_across_facts() {
        let embedder = Arc::new(MockEmbedder::new());
        let index = Arc::new(MemoryVectorIndex::new());
        index
            .insert(
                vec![
                    embedder.embed("User is vegetarian").await.unwrap(),
                    embedder.embed("User lives in Berlin").await.unwrap(),
                ],
                vec!["m1".into(), "m2".into()],
                vec![
                    payload("User is vegetarian", "alex"),
                    payload("User lives in Berlin", "alex"),
                ],
            )
            .await
            .unwrap();

        let retriever = CandidateRetriever::new(embedder.clone(), index, 5);
        let facts = vec!["User eats fish".to_string(), "User moved to Paris".to_string()];
        let output = retriever
            .retrieve(&facts, &user_filter("alex"))
            .await
            .unwrap();

        // Both stored memories surface; duplicates collapse by id.
        assert_eq!(output.candidates.len(), 2);
        let ids: Vec<&str> = output.candidates.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"m1"));
        assert!(ids.contains(&"m2"));
    }

    #[tokio::test]
    async fn caches_one_embedding_per_fact_text() {
        let embedder = Arc::new(MockEmbedder::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let retriever = CandidateRetriever::new(embedder.clone(), index, 5);

        let facts = vec![
            "User is vegetarian".to_string(),
            "User is vegetarian".to_string(),
            "User lives in Berlin".to_string(),
        ];
        let output = retriever
            .retrieve(&facts, &user_filter("alex"))
            .await
            .unwrap();

        assert_eq!(output.embeddings.len(), 2);
        // The repeated fact hits the cache, not the embedder.
        assert_eq!(embedder.calls(), 2);
        assert!(output.embeddings.contains_key("User is vegetarian"));
        assert!(output.embeddings.contains_key("User lives in Berlin"));
    }

    #[tokio::test]
    async fn scope_filter_excludes_other_owners() {
        let embedder = Arc::new(MockEmbedder::new());
        let index = Arc::new(MemoryVectorIndex::new());
        index
            .insert(
                vec![embedder.embed("User is vegetarian").await.unwrap()],
                vec!["m1".into()],
                vec![payload("User is vegetarian", "sam")],
            )
            .await
            .unwrap();

        let retriever = CandidateRetriever::new(embedder, index, 5);
        let facts = vec!["User is vegetarian".to_string()];
        let output = retriever
            .retrieve(&facts, &user_filter("alex"))
            .await
            .unwrap();

        assert!(output.candidates.is_empty());
        // The embedding is still cached for the executor.
        assert_eq!(output.embeddings.len(), 1);
    }
}
