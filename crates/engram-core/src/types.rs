// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Engram memory engine and its backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// Payload key holding the fact text.
pub const DATA_KEY: &str = "data";
/// Payload key holding the content hash.
pub const HASH_KEY: &str = "hash";
/// Payload key holding the creation timestamp.
pub const CREATED_AT_KEY: &str = "created_at";
/// Payload key holding the last-update timestamp.
pub const UPDATED_AT_KEY: &str = "updated_at";
/// Ownership-scope payload keys.
pub const USER_ID_KEY: &str = "user_id";
pub const AGENT_ID_KEY: &str = "agent_id";
pub const RUN_ID_KEY: &str = "run_id";

/// The three keys that partition memories by ownership.
pub const SCOPE_KEYS: [&str; 3] = [USER_ID_KEY, AGENT_ID_KEY, RUN_ID_KEY];

/// Keys reserved by the engine; caller metadata must never collide with these.
pub const RESERVED_KEYS: [&str; 7] = [
    DATA_KEY,
    HASH_KEY,
    CREATED_AT_KEY,
    UPDATED_AT_KEY,
    USER_ID_KEY,
    AGENT_ID_KEY,
    RUN_ID_KEY,
];

/// A scalar value stored in payload metadata and filter maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Str(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl MetadataValue {
    /// Returns the string content if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Free-form key→scalar metadata attached to a memory record.
pub type MetadataMap = BTreeMap<String, MetadataValue>;

/// Exact-match filter map passed to the vector index.
pub type Filters = BTreeMap<String, MetadataValue>;

/// Returns true if the filter map carries at least one ownership-scope key.
pub fn has_scope_key(filters: &Filters) -> bool {
    SCOPE_KEYS.iter().any(|key| filters.contains_key(*key))
}

/// Removes reserved engine keys from caller metadata so they can never
/// shadow the payload's own fields.
pub fn sanitize_metadata(mut metadata: MetadataMap) -> MetadataMap {
    metadata.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));
    metadata
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation input to `add`: either a bare string (normalized to a
/// single user turn) or an ordered list of turns.
#[derive(Debug, Clone, PartialEq)]
pub struct Messages(pub Vec<Message>);

impl From<&str> for Messages {
    fn from(text: &str) -> Self {
        Messages(vec![Message::user(text)])
    }
}

impl From<String> for Messages {
    fn from(text: String) -> Self {
        Messages(vec![Message::user(text)])
    }
}

impl From<Vec<Message>> for Messages {
    fn from(turns: Vec<Message>) -> Self {
        Messages(turns)
    }
}

impl From<&[Message]> for Messages {
    fn from(turns: &[Message]) -> Self {
        Messages(turns.to_vec())
    }
}

/// Ownership scope partitioning memories by user, agent, and run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryScope {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
    pub run_id: Option<String>,
}

impl MemoryScope {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn agent(id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn run(id: impl Into<String>) -> Self {
        Self {
            run_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_agent(mut self, id: impl Into<String>) -> Self {
        self.agent_id = Some(id.into());
        self
    }

    pub fn with_run(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// True when no scope key is set.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.agent_id.is_none() && self.run_id.is_none()
    }

    /// Merges the scope keys into an exact-match filter map.
    pub fn apply_to(&self, filters: &mut Filters) {
        if let Some(user_id) = &self.user_id {
            filters.insert(USER_ID_KEY.to_string(), user_id.as_str().into());
        }
        if let Some(agent_id) = &self.agent_id {
            filters.insert(AGENT_ID_KEY.to_string(), agent_id.as_str().into());
        }
        if let Some(run_id) = &self.run_id {
            filters.insert(RUN_ID_KEY.to_string(), run_id.as_str().into());
        }
    }

    /// Reconstructs the scope from whichever scope keys a filter map carries.
    pub fn from_filters(filters: &Filters) -> Self {
        let get = |key: &str| {
            filters
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            user_id: get(USER_ID_KEY),
            agent_id: get(AGENT_ID_KEY),
            run_id: get(RUN_ID_KEY),
        }
    }
}

/// Mutation classification recorded in the audit trail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryEvent {
    Add,
    Update,
    Delete,
}

/// A payload stored alongside a vector in the index.
///
/// Reserved fields (`data`, `hash`, timestamps, scope keys) live on the
/// struct; everything else is free-form caller metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPayload {
    /// The fact text.
    pub data: String,
    /// Content hash of `data`.
    pub hash: String,
    /// Creation timestamp, RFC 3339 with millisecond precision.
    pub created_at: String,
    /// Last-update timestamp; absent until the first update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Caller metadata; never contains reserved keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: MetadataMap,
}

impl VectorPayload {
    /// Looks up a reserved or metadata value by payload key.
    pub fn value(&self, key: &str) -> Option<MetadataValue> {
        match key {
            DATA_KEY => Some(self.data.as_str().into()),
            HASH_KEY => Some(self.hash.as_str().into()),
            CREATED_AT_KEY => Some(self.created_at.as_str().into()),
            UPDATED_AT_KEY => self.updated_at.as_deref().map(Into::into),
            USER_ID_KEY => self.user_id.as_deref().map(Into::into),
            AGENT_ID_KEY => self.agent_id.as_deref().map(Into::into),
            RUN_ID_KEY => self.run_id.as_deref().map(Into::into),
            other => self.metadata.get(other).cloned(),
        }
    }

    /// Exact-match check against a filter map. Every filter key must be
    /// present with an equal value.
    pub fn matches(&self, filters: &Filters) -> bool {
        filters
            .iter()
            .all(|(key, expected)| self.value(key).as_ref() == Some(expected))
    }

    /// The ownership scope carried by this payload.
    pub fn scope(&self) -> MemoryScope {
        MemoryScope {
            user_id: self.user_id.clone(),
            agent_id: self.agent_id.clone(),
            run_id: self.run_id.clone(),
        }
    }
}

/// A vector index hit: id, optional similarity score, and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub score: Option<f32>,
    pub payload: VectorPayload,
}

/// The public shape of a stored memory, reshaped from the index payload
/// with scope keys split out from free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub hash: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: MetadataMap,
}

impl From<VectorRecord> for MemoryRecord {
    fn from(record: VectorRecord) -> Self {
        let VectorRecord { id, score, payload } = record;
        MemoryRecord {
            id,
            text: payload.data,
            hash: payload.hash,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
            score,
            user_id: payload.user_id,
            agent_id: payload.agent_id,
            run_id: payload.run_id,
            metadata: payload.metadata,
        }
    }
}

/// One successfully applied mutation returned by `add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMutation {
    pub id: String,
    pub text: String,
    pub event: MemoryEvent,
    /// The superseded text, present on UPDATE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_text: Option<String>,
}

/// One immutable audit trail row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub memory_id: String,
    pub old_memory: String,
    pub new_memory: String,
    pub event: MemoryEvent,
    pub created_at: String,
    pub updated_at: String,
    pub is_deleted: bool,
}

/// Input to `AuditLog::append`; the store assigns the row id and defaults
/// missing timestamps to now.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub memory_id: String,
    pub old_memory: String,
    pub new_memory: String,
    pub event: MemoryEvent,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_deleted: bool,
}

/// Which request shape a language-model backend expects for schema-bound
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolDialect {
    /// Backend honors a JSON-schema structured-output request directly.
    StructuredJson,
    /// Backend only supports named tool calls; schema-bound requests are
    /// issued as a forced call of an equivalently-shaped tool.
    NamedTools,
}

/// Capability descriptor a language-model backend declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCapability {
    /// Identity string, e.g. "openai" or "anthropic".
    pub provider: String,
    pub dialect: ToolDialect,
}

/// A named tool exposed to tool-calling backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool arguments.
    pub parameters: serde_json::Value,
}

/// Tool selection constraint for a tool-calling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
    Required,
}

/// A tool invocation returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Result of a tool-calling generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// A telemetry event recorded through the injected sink.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub operation: &'static str,
    pub attributes: Vec<(&'static str, String)>,
}

impl TelemetryEvent {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((key, value.into()));
        self
    }
}

/// SHA-256 content hash of a fact text, hex-encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current UTC time, RFC 3339 with millisecond precision.
pub fn utc_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payload() -> VectorPayload {
        VectorPayload {
            data: "User is vegetarian".into(),
            hash: content_hash("User is vegetarian"),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: None,
            user_id: Some("alex".into()),
            agent_id: None,
            run_id: None,
            metadata: MetadataMap::from([("topic".to_string(), "diet".into())]),
        }
    }

    #[test]
    fn scope_round_trips_through_filters() {
        let scope = MemoryScope::user("alex").with_agent("helper");
        let mut filters = Filters::new();
        scope.apply_to(&mut filters);

        assert!(has_scope_key(&filters));
        assert_eq!(MemoryScope::from_filters(&filters), scope);
    }

    #[test]
    fn empty_scope_adds_no_filter_keys() {
        let scope = MemoryScope::default();
        assert!(scope.is_empty());

        let mut filters = Filters::new();
        scope.apply_to(&mut filters);
        assert!(filters.is_empty());
        assert!(!has_scope_key(&filters));
    }

    #[test]
    fn bare_string_becomes_single_user_turn() {
        let messages: Messages = "I'm vegetarian".into();
        assert_eq!(messages.0.len(), 1);
        assert_eq!(messages.0[0].role, Role::User);
        assert_eq!(messages.0[0].content, "I'm vegetarian");
    }

    #[test]
    fn memory_event_wire_format() {
        assert_eq!(MemoryEvent::Add.to_string(), "ADD");
        assert_eq!(MemoryEvent::Update.to_string(), "UPDATE");
        assert_eq!(MemoryEvent::Delete.to_string(), "DELETE");
        assert_eq!(MemoryEvent::from_str("DELETE").unwrap(), MemoryEvent::Delete);
        assert!(MemoryEvent::from_str("NONE").is_err());
    }

    #[test]
    fn payload_matches_scope_and_metadata_filters() {
        let p = payload();

        let mut filters = Filters::new();
        filters.insert(USER_ID_KEY.into(), "alex".into());
        assert!(p.matches(&filters));

        filters.insert("topic".into(), "diet".into());
        assert!(p.matches(&filters));

        filters.insert("topic".into(), "music".into());
        assert!(!p.matches(&filters));

        let mut other_user = Filters::new();
        other_user.insert(USER_ID_KEY.into(), "sam".into());
        assert!(!p.matches(&other_user));
    }

    #[test]
    fn payload_missing_key_never_matches() {
        let p = payload();
        let mut filters = Filters::new();
        filters.insert(RUN_ID_KEY.into(), "run-1".into());
        assert!(!p.matches(&filters));
    }

    #[test]
    fn record_reshape_splits_scope_from_metadata() {
        let record = VectorRecord {
            id: "m1".into(),
            score: Some(0.8),
            payload: payload(),
        };
        let reshaped: MemoryRecord = record.into();
        assert_eq!(reshaped.id, "m1");
        assert_eq!(reshaped.text, "User is vegetarian");
        assert_eq!(reshaped.user_id.as_deref(), Some("alex"));
        assert_eq!(reshaped.score, Some(0.8));
        assert_eq!(
            reshaped.metadata.get("topic").and_then(|v| v.as_str()),
            Some("diet")
        );
        assert!(!reshaped.metadata.contains_key(USER_ID_KEY));
    }

    #[test]
    fn sanitize_strips_reserved_keys() {
        let mut metadata = MetadataMap::new();
        metadata.insert("topic".into(), "diet".into());
        metadata.insert(DATA_KEY.into(), "spoofed".into());
        metadata.insert(USER_ID_KEY.into(), "spoofed".into());

        let clean = sanitize_metadata(metadata);
        assert_eq!(clean.len(), 1);
        assert!(clean.contains_key("topic"));
    }

    #[test]
    fn content_hash_is_stable_and_distinct() {
        assert_eq!(content_hash("a"), content_hash("a"));
        assert_ne!(content_hash("a"), content_hash("b"));
        assert_eq!(content_hash("a").len(), 64);
    }

    #[test]
    fn utc_now_has_millisecond_precision() {
        let now = utc_now();
        assert!(now.ends_with('Z'));
        // 2026-01-01T00:00:00.000Z
        assert_eq!(now.len(), 24);
    }

    #[test]
    fn metadata_value_serde_untagged() {
        let v: MetadataValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(v, MetadataValue::Str("hello".into()));
        let v: MetadataValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, MetadataValue::Int(42));
        let v: MetadataValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, MetadataValue::Bool(true));
    }
}
