// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based fact extraction from conversations.
//!
//! One schema-bound call turns a conversation into an ordered list of
//! atomic factual strings. A failed call yields an empty list: pure
//! chit-chat must never abort the surrounding `add`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use engram_core::types::Message;
use engram_core::{EngramError, LanguageModel};

use crate::dialect::generate_schema_bound;
use crate::prompts;

#[derive(Debug, Deserialize)]
struct FactList {
    facts: Vec<String>,
}

/// Extracts memorable facts from role-tagged conversation turns.
pub(crate) struct FactExtractor {
    llm: Arc<dyn LanguageModel>,
    custom_prompt: Option<String>,
}

impl FactExtractor {
    pub(crate) fn new(llm: Arc<dyn LanguageModel>, custom_prompt: Option<String>) -> Self {
        Self { llm, custom_prompt }
    }

    /// Returns the extracted facts verbatim, order preserved, duplicates
    /// not collapsed. Extraction failure is recovered locally as an empty
    /// list.
    pub(crate) async fn extract(&self, messages: &[Message]) -> Vec<String> {
        let conversation = prompts::flatten_conversation(messages);
        let instruction = self
            .custom_prompt
            .clone()
            .unwrap_or_else(|| prompts::FACT_EXTRACTION_PROMPT.to_string());
        let request = vec![
            Message::system(instruction),
            Message::user(prompts::extraction_input(&conversation)),
        ];

        match self.call(&request).await {
            Ok(facts) => {
                debug!(count = facts.len(), "facts extracted");
                facts
            }
            Err(e) => {
                warn!(error = %e, "fact extraction failed, continuing with no facts");
                Vec::new()
            }
        }
    }

    async fn call(&self, request: &[Message]) -> Result<Vec<String>, EngramError> {
        let value = generate_schema_bound(
            self.llm.as_ref(),
            request,
            &prompts::extraction_schema(),
            prompts::extract_facts_tool(),
        )
        .await?;
        let list: FactList = serde_json::from_value(value)
            .map_err(|e| EngramError::Extraction(format!("malformed extraction response: {e}")))?;
        Ok(list.facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_test_utils::MockLanguageModel;
    use serde_json::json;

    #[tokio::test]
    async fn returns_facts_in_order() {
        let model = Arc::new(MockLanguageModel::with_structured_responses(vec![json!({
            "facts": ["Name is Alex", "Is vegetarian", "Is vegetarian"]
        })]));
        let extractor = FactExtractor::new(model, None);

        let facts = extractor.extract(&[Message::user("Hi, I'm Alex...")]).await;
        // Order preserved, duplicates not collapsed at this stage.
        assert_eq!(
            facts,
            vec!["Name is Alex", "Is vegetarian", "Is vegetarian"]
        );
    }

    #[tokio::test]
    async fn provider_failure_yields_empty_list() {
        let model = Arc::new(MockLanguageModel::new());
        model.push_structured_error("rate limited");
        let extractor = FactExtractor::new(model, None);

        let facts = extractor.extract(&[Message::user("hello")]).await;
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn malformed_response_yields_empty_list() {
        let model = Arc::new(MockLanguageModel::with_structured_responses(vec![json!({
            "unexpected": true
        })]));
        let extractor = FactExtractor::new(model, None);

        let facts = extractor.extract(&[Message::user("hello")]).await;
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn custom_prompt_replaces_builtin_instruction() {
        let model = Arc::new(MockLanguageModel::with_structured_responses(vec![json!({
            "facts": []
        })]));
        let extractor = FactExtractor::new(model.clone(), Some("Only extract plans.".into()));

        extractor.extract(&[Message::user("hello")]).await;

        let requests = model.structured_requests();
        assert_eq!(requests[0][0].content, "Only extract plans.");
    }

    #[tokio::test]
    async fn conversation_is_flattened_into_the_input_turn() {
        let model = Arc::new(MockLanguageModel::with_structured_responses(vec![json!({
            "facts": []
        })]));
        let extractor = FactExtractor::new(model.clone(), None);

        extractor
            .extract(&[
                Message::user("I'm vegetarian"),
                Message::assistant("Noted!"),
            ])
            .await;

        let requests = model.structured_requests();
        let input = &requests[0][1].content;
        assert!(input.starts_with("Input: "));
        assert!(input.contains("user: I'm vegetarian"));
        assert!(input.contains("assistant: Noted!"));
    }
}
