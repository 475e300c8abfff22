//! Record normalizer
//!
//! Projects a raw JSON object onto [`LogEnvelope`], the typed view the
//! aggregator reads. The projection is lenient about absence (every field is
//! optional) but strict about type: a record whose `uuid` is a number, for
//! example, fails the projection and is dropped by the caller.

use super::RawRecord;
use crate::analysis::measure::parse_timestamp;
use serde::Deserialize;
use serde_json::Value;

/// Typed projection of one log record.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEnvelope {
    /// Assistant message whose tool-use this record answers
    pub parent_uuid: Option<String>,
    pub cwd: Option<String>,
    pub session_id: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub uuid: Option<String>,
    pub timestamp: Option<String>,

    /// Message sub-document; only `content` is read, and only for assistant records
    pub message: Option<Value>,

    /// Tool result; shape varies by tool. JSON `null` projects to `None`.
    pub tool_use_result: Option<Value>,
}

/// A `tool_use` content block of an assistant message.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ToolUse {
    pub name: String,
    pub input: Value,
}

impl ToolUse {
    /// String argument of the tool input, empty when absent or not a string.
    pub fn input_str(&self, key: &str) -> &str {
        self.input.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

impl LogEnvelope {
    /// Normalize a raw record.
    pub fn from_raw(raw: RawRecord) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(raw))
    }

    pub fn is_assistant(&self) -> bool {
        self.record_type.as_deref() == Some("assistant")
    }

    /// Record timestamp in Unix milliseconds, 0 when missing or unparseable.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.as_deref().map(parse_timestamp).unwrap_or(0)
    }

    pub fn cwd(&self) -> &str {
        self.cwd.as_deref().unwrap_or("")
    }

    pub fn uuid(&self) -> &str {
        self.uuid.as_deref().unwrap_or("")
    }

    pub fn parent_uuid(&self) -> &str {
        self.parent_uuid.as_deref().unwrap_or("")
    }

    /// Tool-use blocks of the message content, in order.
    ///
    /// Blocks that are not objects, are not `tool_use`, or fail to project
    /// are skipped individually.
    pub fn tool_uses(&self) -> Vec<ToolUse> {
        let Some(blocks) = self
            .message
            .as_ref()
            .and_then(|m| m.get("content"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
            .filter_map(|block| ToolUse::deserialize(block).ok())
            .collect()
    }
}
