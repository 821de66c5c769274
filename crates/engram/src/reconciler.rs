// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of new facts against retrieved candidates.
//!
//! Real memory ids are long opaque strings a language model can
//! transcribe incorrectly or invent. Before candidates reach the model,
//! each real id is remapped to a small sequential integer label; only
//! labels cross the model boundary, and every label in the response is
//! resolved back through the per-call map before execution. A label the
//! map never assigned is a protocol violation: that decision is dropped
//! with a warning and the batch continues.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use engram_core::types::Message;
use engram_core::{EngramError, LanguageModel};

use crate::dialect::generate_schema_bound;
use crate::prompts;
use crate::retriever::Candidate;

/// A candidate as presented to the model: label instead of real id.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LabeledMemory {
    pub id: String,
    pub text: String,
}

/// Per-call label→real-id map. Scoped to one reconciliation, never
/// shared, discarded after use.
pub(crate) struct LabelMap {
    labels: HashMap<String, String>,
}

impl LabelMap {
    /// Assigns labels `0..N-1` to the candidate set, in order.
    pub(crate) fn assign(candidates: &[Candidate]) -> (Self, Vec<LabeledMemory>) {
        let mut labels = HashMap::with_capacity(candidates.len());
        let mut labeled = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let label = index.to_string();
            labels.insert(label.clone(), candidate.id.clone());
            labeled.push(LabeledMemory {
                id: label,
                text: candidate.text.clone(),
            });
        }
        (Self { labels }, labeled)
    }

    /// Resolves a label back to the real id.
    pub(crate) fn resolve(&self, label: &str) -> Result<String, EngramError> {
        self.labels.get(label).cloned().ok_or_else(|| {
            EngramError::Protocol(format!("label {label:?} was never assigned to a candidate"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DecisionEvent {
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "NONE")]
    None,
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    id: String,
    text: String,
    #[serde(default)]
    old_memory: Option<String>,
    event: DecisionEvent,
}

#[derive(Debug, Deserialize)]
struct ReconcileResponse {
    memory: Vec<RawDecision>,
}

/// A classified decision with its label already resolved to a real id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Decision {
    Add {
        text: String,
    },
    Update {
        id: String,
        text: String,
        /// The model's view of the superseded text, echoed back to the
        /// caller; the audit entry records the actual stored text.
        old_text: Option<String>,
    },
    Delete {
        id: String,
        text: String,
    },
}

pub(crate) struct Reconciler {
    llm: Arc<dyn LanguageModel>,
}

impl Reconciler {
    pub(crate) fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Classifies each fact against the candidate set.
    ///
    /// Returns only executable decisions: NONE entries are logged and
    /// unresolvable labels are dropped per the identifier-safety
    /// protocol.
    pub(crate) async fn reconcile(
        &self,
        facts: &[String],
        candidates: &[Candidate],
    ) -> Result<Vec<Decision>, EngramError> {
        let (label_map, labeled) = LabelMap::assign(candidates);

        let old_memories_json = serde_json::to_string_pretty(&labeled)
            .map_err(|e| EngramError::Internal(format!("candidate serialization: {e}")))?;
        let facts_json = serde_json::to_string(facts)
            .map_err(|e| EngramError::Internal(format!("fact serialization: {e}")))?;
        let prompt = prompts::reconcile_prompt(&old_memories_json, &facts_json);

        let value = generate_schema_bound(
            self.llm.as_ref(),
            &[Message::user(prompt)],
            &prompts::reconcile_schema(),
            prompts::update_memory_tool(),
        )
        .await?;
        let response: ReconcileResponse =
            serde_json::from_value(value).map_err(|e| EngramError::Provider {
                message: format!("malformed reconciliation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mut decisions = Vec::new();
        for raw in response.memory {
            match raw.event {
                DecisionEvent::Add => decisions.push(Decision::Add { text: raw.text }),
                DecisionEvent::Update => match label_map.resolve(&raw.id) {
                    Ok(id) => decisions.push(Decision::Update {
                        id,
                        text: raw.text,
                        old_text: raw.old_memory,
                    }),
                    Err(e) => warn!(error = %e, "dropping UPDATE decision"),
                },
                DecisionEvent::Delete => match label_map.resolve(&raw.id) {
                    Ok(id) => decisions.push(Decision::Delete { id, text: raw.text }),
                    Err(e) => warn!(error = %e, "dropping DELETE decision"),
                },
                DecisionEvent::None => {
                    debug!(label = %raw.id, "no action needed for memory");
                }
            }
        }
        Ok(decisions)
    }
}
