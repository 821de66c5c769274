// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model backend contract.

use async_trait::async_trait;

use crate::error::EngramError;
use crate::types::{Message, ModelCapability, ToolChoice, ToolOutput, ToolSpec};

/// A language-model backend.
///
/// The engine issues two kinds of schema-bound requests (fact extraction
/// and memory reconciliation). Backends that cannot honor a structured
/// JSON request declare the `NamedTools` dialect in their capability and
/// receive the same schemas as forced tool calls instead; call sites pick
/// the request shape by capability lookup, never by provider-name
/// branching.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Declares the backend's identity and tool dialect.
    fn capability(&self) -> ModelCapability;

    /// Generates output conforming to the given JSON schema.
    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, EngramError>;

    /// Generates free-form text.
    async fn generate_text(&self, messages: &[Message]) -> Result<String, EngramError>;

    /// Generates text with access to named tools.
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        tool_choice: ToolChoice,
    ) -> Result<ToolOutput, EngramError>;
}
