//! Invocation index (first pass)
//!
//! Walks the envelopes once, in input order, to collect:
//! - session context: first non-empty working directory and session id, and
//!   the maximum timestamp
//! - the assistant-message uuid → tool name map used to resolve results
//! - per-tool call counts
//! - run-command details, which come from the tool-use *input* rather than
//!   from a result record

use super::measure::count_chars;
use crate::ingest::{LogEnvelope, ToolUse};
use crate::types::{DetailBase, RunCommandDetail, ToolCallCounts};
use std::collections::HashMap;

/// Tool name whose tool-use input yields a run-command detail.
const BASH_TOOL: &str = "Bash";

/// Output of the first pass. Scoped to a single aggregation.
#[derive(Debug, Default)]
pub struct InvocationIndex {
    pub folder_path: Option<String>,
    pub task_id: Option<String>,
    pub last_timestamp: i64,
    pub tool_counts: ToolCallCounts,
    pub run_details: Vec<RunCommandDetail>,
    tool_by_uuid: HashMap<String, String>,
}

impl InvocationIndex {
    /// Build the index over all envelopes.
    pub fn build<'a, I>(envelopes: I) -> Self
    where
        I: IntoIterator<Item = &'a LogEnvelope>,
    {
        let mut index = Self::default();
        for envelope in envelopes {
            index.observe(envelope);
        }
        index
    }

    /// Tool name invoked by the assistant message with this uuid.
    pub fn tool_for(&self, uuid: &str) -> Option<&str> {
        if uuid.is_empty() {
            return None;
        }
        self.tool_by_uuid.get(uuid).map(String::as_str)
    }

    fn observe(&mut self, envelope: &LogEnvelope) {
        if self.folder_path.is_none() && !envelope.cwd().is_empty() {
            self.folder_path = Some(envelope.cwd().to_string());
        }
        if self.task_id.is_none() {
            if let Some(session_id) = envelope.session_id.as_deref().filter(|s| !s.is_empty()) {
                self.task_id = Some(session_id.to_string());
            }
        }

        let timestamp = envelope.timestamp_millis();
        if timestamp > self.last_timestamp {
            self.last_timestamp = timestamp;
        }

        if !envelope.is_assistant() {
            return;
        }

        for tool_use in envelope.tool_uses() {
            if tool_use.name.is_empty() {
                continue;
            }

            // One uuid with several tool-use blocks keeps the last one
            if !envelope.uuid().is_empty() {
                self.tool_by_uuid
                    .insert(envelope.uuid().to_string(), tool_use.name.clone());
            }
            self.tool_counts.increment(&tool_use.name);

            if tool_use.name == BASH_TOOL {
                let detail = self.run_detail(envelope, &tool_use, timestamp);
                self.run_details.push(detail);
            }
        }
    }

    fn run_detail(
        &self,
        envelope: &LogEnvelope,
        tool_use: &ToolUse,
        timestamp: i64,
    ) -> RunCommandDetail {
        let cwd = if envelope.cwd().is_empty() {
            self.folder_path.clone().unwrap_or_default()
        } else {
            envelope.cwd().to_string()
        };
        let command = tool_use.input_str("command");

        RunCommandDetail {
            base: DetailBase {
                file_path: cwd,
                line_count: 0,
                character_count: count_chars(command),
                timestamp,
            },
            command: command.to_string(),
            description: tool_use.input_str("description").to_string(),
        }
    }
}
