// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema-bound generation across backend tool dialects.
//!
//! Backends declare whether they honor structured JSON requests or only
//! named tool calls; call sites route by that capability instead of
//! branching on provider names.

use engram_core::types::{Message, ToolChoice, ToolDialect, ToolSpec};
use engram_core::{EngramError, LanguageModel};

/// Issues a schema-bound request in whichever shape the backend supports.
///
/// For `NamedTools` backends the schema is carried by a forced call of an
/// equivalently-shaped tool, and the tool arguments are the response.
pub(crate) async fn generate_schema_bound(
    llm: &dyn LanguageModel,
    messages: &[Message],
    schema: &serde_json::Value,
    tool: ToolSpec,
) -> Result<serde_json::Value, EngramError> {
    match llm.capability().dialect {
        ToolDialect::StructuredJson => llm.generate_structured(messages, schema).await,
        ToolDialect::NamedTools => {
            let tool_name = tool.name.clone();
            let output = llm
                .generate_with_tools(messages, &[tool], ToolChoice::Required)
                .await?;
            output
                .tool_calls
                .into_iter()
                .find(|call| call.name == tool_name)
                .map(|call| call.arguments)
                .ok_or_else(|| EngramError::Provider {
                    message: format!("backend returned no {tool_name} tool call"),
                    source: None,
                })
        }
    }
}
