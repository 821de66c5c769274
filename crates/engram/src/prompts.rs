// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates, structured-output schemas, and their named-tool
//! equivalents for the extraction and reconciliation calls.

use engram_core::types::{Message, Role, ToolSpec};
use serde_json::json;

/// Built-in instruction for the fact-extraction call.
pub(crate) const FACT_EXTRACTION_PROMPT: &str = r#"You are a personal information organizer. Your job is to read a conversation and extract the facts worth remembering for future conversations.

Extract:
1. Personal details: names, relationships, locations, important dates.
2. Preferences: likes, dislikes, dietary choices, style of working.
3. Plans and intentions: upcoming events, trips, goals.
4. Activity and service details: restaurants, tools, products the person engages with.
5. Health and wellness details the person shares voluntarily.
6. Professional context: job titles, projects, collaborators.

Rules:
- Each fact must be a short, self-contained statement.
- Only record information stated by the user, not the assistant's replies.
- Do not invent facts; if the conversation contains nothing worth remembering, return an empty list.
- Keep the facts in the order they appear in the conversation.

Return a JSON object of the form {"facts": ["fact 1", "fact 2"]}.

Examples:
Input: user: Hi.
Output: {"facts": []}
Input: user: I'm Alex. I'm vegetarian and allergic to nuts.
Output: {"facts": ["Name is Alex", "Is vegetarian", "Is allergic to nuts"]}
Input: user: We closed the search project last Friday.
Output: {"facts": ["Closed the search project last Friday"]}"#;

/// Builds the user turn for the extraction call.
pub(crate) fn extraction_input(conversation: &str) -> String {
    format!("Input: {conversation}")
}

/// Flattens role-tagged turns into `role: content` lines, order preserved.
/// System turns are retained here; only graph ingestion excludes them.
pub(crate) fn flatten_conversation(messages: &[Message]) -> String {
    let mut result = String::new();
    for message in messages {
        result.push_str(&format!("{}: {}\n", message.role, message.content));
    }
    result
}

/// Conversation text fed to the graph pipeline: non-system turns,
/// newline-joined.
pub(crate) fn graph_payload(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != Role::System && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the reconciliation prompt from the labeled memory set and the
/// new facts, both pre-rendered as JSON.
pub(crate) fn reconcile_prompt(old_memories_json: &str, facts_json: &str) -> String {
    format!(
        r#"You are a memory manager. Compare newly retrieved facts against the existing memory and decide, for every element of the result, one of four operations:

- ADD: the fact carries new information not present in any existing memory. Use a new placeholder id.
- UPDATE: the fact refines or supersedes an existing memory. Use that memory's id, put the updated statement in "text", and copy the superseded statement into "old_memory".
- DELETE: the fact contradicts an existing memory and invalidates it. Use that memory's id.
- NONE: the fact is already captured or adds nothing. Use the matching memory's id if one exists.

Guidelines:
- Never modify the "id" values beyond choosing among the ones listed below.
- Prefer UPDATE over ADD when a fact and a memory describe the same thing at different detail.
- If the existing memory list is empty, every fact is an ADD.

Existing memory:
{old_memories_json}

Newly retrieved facts:
{facts_json}

Return a JSON object of the form {{"memory": [{{"id": "...", "text": "...", "old_memory": "...", "event": "ADD|UPDATE|DELETE|NONE"}}]}} with one element per decision. Omit "old_memory" except for UPDATE."#
    )
}

/// JSON schema for the extraction response.
pub(crate) fn extraction_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "facts": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["facts"]
    })
}

/// JSON schema for the reconciliation response.
pub(crate) fn reconcile_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "memory": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "text": { "type": "string" },
                        "old_memory": { "type": "string" },
                        "event": {
                            "type": "string",
                            "enum": ["ADD", "UPDATE", "DELETE", "NONE"]
                        }
                    },
                    "required": ["id", "text", "event"]
                }
            }
        },
        "required": ["memory"]
    })
}

/// Named-tool equivalent of the extraction schema for tool-calling
/// backends.
pub(crate) fn extract_facts_tool() -> ToolSpec {
    ToolSpec {
        name: "extract_facts".to_string(),
        description: "Record the atomic factual statements extracted from the conversation."
            .to_string(),
        parameters: extraction_schema(),
    }
}

/// Named-tool equivalent of the reconciliation schema.
pub(crate) fn update_memory_tool() -> ToolSpec {
    ToolSpec {
        name: "update_memory".to_string(),
        description:
            "Record the ADD/UPDATE/DELETE/NONE decision for each fact compared against the existing memory."
                .to_string(),
        parameters: reconcile_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_roles_and_order() {
        let messages = vec![
            Message::system("be brief"),
            Message::user("I'm vegetarian"),
            Message::assistant("Noted!"),
        ];
        let flat = flatten_conversation(&messages);
        assert_eq!(flat, "system: be brief\nuser: I'm vegetarian\nassistant: Noted!\n");
    }

    #[test]
    fn graph_payload_excludes_system_turns() {
        let messages = vec![
            Message::system("be brief"),
            Message::user("I'm vegetarian"),
            Message::assistant("Noted!"),
        ];
        assert_eq!(graph_payload(&messages), "I'm vegetarian\nNoted!");
    }

    #[test]
    fn graph_payload_skips_empty_turns() {
        let messages = vec![Message::user(""), Message::user("hello")];
        assert_eq!(graph_payload(&messages), "hello");
    }

    #[test]
    fn reconcile_prompt_embeds_both_inputs() {
        let prompt = reconcile_prompt(r#"[{"id":"0","text":"old"}]"#, r#"["new fact"]"#);
        assert!(prompt.contains(r#"[{"id":"0","text":"old"}]"#));
        assert!(prompt.contains(r#"["new fact"]"#));
        assert!(prompt.contains("ADD"));
        assert!(prompt.contains("NONE"));
    }

    #[test]
    fn schemas_require_expected_fields() {
        let extraction = extraction_schema();
        assert_eq!(extraction["required"][0], "facts");

        let reconcile = reconcile_schema();
        let item = &reconcile["properties"]["memory"]["items"];
        assert_eq!(item["required"], serde_json::json!(["id", "text", "event"]));
    }

    #[test]
    fn tools_reuse_the_schemas() {
        assert_eq!(extract_facts_tool().parameters, extraction_schema());
        assert_eq!(update_memory_tool().parameters, reconcile_schema());
    }
}
