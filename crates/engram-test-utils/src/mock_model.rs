// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model replaying scripted responses.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use engram_core::types::{
    Message, ModelCapability, ToolChoice, ToolDialect, ToolOutput, ToolSpec,
};
use engram_core::{EngramError, LanguageModel};

/// A language model that pops pre-configured responses from FIFO queues.
///
/// Structured responses are scripted as `Result` values so tests can
/// exercise both success and provider-failure paths. An empty queue is a
/// provider error, so a test that forgets to script a call fails loudly.
pub struct MockLanguageModel {
    dialect: ToolDialect,
    structured: Mutex<VecDeque<Result<serde_json::Value, String>>>,
    text: Mutex<VecDeque<String>>,
    tool_outputs: Mutex<VecDeque<ToolOutput>>,
    structured_requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            dialect: ToolDialect::StructuredJson,
            structured: Mutex::new(VecDeque::new()),
            text: Mutex::new(VecDeque::new()),
            tool_outputs: Mutex::new(VecDeque::new()),
            structured_requests: Mutex::new(Vec::new()),
        }
    }

    /// Pre-loads structured responses, returned in order.
    pub fn with_structured_responses(responses: Vec<serde_json::Value>) -> Self {
        let model = Self::new();
        for response in responses {
            model.push_structured(response);
        }
        model
    }

    /// Switches the declared tool dialect.
    pub fn with_dialect(mut self, dialect: ToolDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Queues a successful structured response.
    pub fn push_structured(&self, response: serde_json::Value) {
        self.structured
            .lock()
            .unwrap()
            .push_back(Ok(response));
    }

    /// Queues a structured-call failure.
    pub fn push_structured_error(&self, message: impl Into<String>) {
        self.structured
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
    }

    /// Queues a free-form text response.
    pub fn push_text(&self, text: impl Into<String>) {
        self.text.lock().unwrap().push_back(text.into());
    }

    /// Queues a tool-calling response.
    pub fn push_tool_output(&self, output: ToolOutput) {
        self.tool_outputs.lock().unwrap().push_back(output);
    }

    /// The message lists passed to every structured call so far.
    pub fn structured_requests(&self) -> Vec<Vec<Message>> {
        self.structured_requests.lock().unwrap().clone()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn capability(&self) -> ModelCapability {
        ModelCapability {
            provider: "mock".to_string(),
            dialect: self.dialect,
        }
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, EngramError> {
        self.structured_requests
            .lock()
            .unwrap()
            .push(messages.to_vec());
        match self.structured.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(EngramError::Provider {
                message,
                source: None,
            }),
            None => Err(EngramError::Provider {
                message: "no scripted structured response".to_string(),
                source: None,
            }),
        }
    }

    async fn generate_text(&self, _messages: &[Message]) -> Result<String, EngramError> {
        Ok(self
            .text
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string()))
    }

    async fn generate_with_tools(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
        _tool_choice: ToolChoice,
    ) -> Result<ToolOutput, EngramError> {
        self.tool_outputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngramError::Provider {
                message: "no scripted tool output".to_string(),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn structured_responses_returned_in_order() {
        let model = MockLanguageModel::with_structured_responses(vec![
            json!({"facts": ["first"]}),
            json!({"facts": ["second"]}),
        ]);
        let schema = json!({});

        let first = model
            .generate_structured(&[Message::user("a")], &schema)
            .await
            .unwrap();
        assert_eq!(first["facts"][0], "first");

        let second = model
            .generate_structured(&[Message::user("b")], &schema)
            .await
            .unwrap();
        assert_eq!(second["facts"][0], "second");

        // Queue exhausted: loud failure, not a silent default.
        assert!(model
            .generate_structured(&[Message::user("c")], &schema)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn scripted_error_surfaces_as_provider_error() {
        let model = MockLanguageModel::new();
        model.push_structured_error("rate limited");
        let err = model
            .generate_structured(&[Message::user("a")], &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, EngramError::Provider { .. }));
    }

    #[tokio::test]
    async fn records_structured_request_messages() {
        let model = MockLanguageModel::with_structured_responses(vec![json!({})]);
        model
            .generate_structured(
                &[Message::system("sys"), Message::user("hello")],
                &json!({}),
            )
            .await
            .unwrap();

        let requests = model.structured_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].content, "sys");
        assert_eq!(requests[0][1].content, "hello");
    }

    #[tokio::test]
    async fn text_defaults_when_queue_empty() {
        let model = MockLanguageModel::new();
        let text = model.generate_text(&[Message::user("hi")]).await.unwrap();
        assert_eq!(text, "mock response");
    }
}
