//! Result folder (second pass)
//!
//! For every envelope carrying a `toolUseResult`, resolves the tool kind via
//! the invocation index (`parentUuid` lookup) and appends a kind-specific
//! detail entry, keeping the running totals and the unique-file set in step
//! with the detail arrays.
//!
//! ## Field precedence
//!
//! Results come in several shapes for the same logical fields:
//!
//! | Field | Tried in order |
//! |-------|----------------|
//! | file path | `file.filePath`, `filePath` |
//! | content | `file.content`, `content`, compact JSON of `structuredPatch` |
//!
//! A result whose content is empty after these fallbacks produces nothing.

use super::index::InvocationIndex;
use super::measure::{count_chars, count_lines};
use crate::ingest::LogEnvelope;
use crate::types::{ApplyDiffDetail, DetailBase, ReadDetail, ToolKind, WriteDetail};
use serde_json::Value;
use std::collections::HashSet;

/// Fields extracted from a tool result, after precedence rules.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultFields {
    pub file_path: String,
    pub content: String,
    pub old_string: String,
    pub new_string: String,
}

impl ResultFields {
    /// Extract fields from a `toolUseResult` value of any shape.
    pub fn extract(result: &Value) -> Self {
        let file_path = str_at(result, &["file", "filePath"])
            .or_else(|| str_at(result, &["filePath"]))
            .unwrap_or_default();

        let content = str_at(result, &["file", "content"])
            .or_else(|| str_at(result, &["content"]))
            .map(str::to_string)
            .or_else(|| serialized_patch(result))
            .unwrap_or_default();

        Self {
            file_path: file_path.to_string(),
            content,
            old_string: str_at(result, &["oldString"]).unwrap_or_default().to_string(),
            new_string: str_at(result, &["newString"]).unwrap_or_default().to_string(),
        }
    }
}

/// Non-empty string at a nested object path.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |current, key| current.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn serialized_patch(result: &Value) -> Option<String> {
    match result.get("structuredPatch") {
        None | Some(Value::Null) => None,
        Some(patch) => serde_json::to_string(patch).ok(),
    }
}

/// Accumulators of the second pass.
#[derive(Debug, Default)]
pub struct ResultFolder {
    pub write_details: Vec<WriteDetail>,
    pub read_details: Vec<ReadDetail>,
    pub apply_diff_details: Vec<ApplyDiffDetail>,
    pub unique_files: HashSet<String>,
    pub total_write_lines: usize,
    pub total_read_characters: usize,
    pub total_write_characters: usize,
    pub total_diff_characters: usize,
}

impl ResultFolder {
    /// Fold every result-bearing envelope, in input order.
    pub fn fold_all<'a, I>(index: &InvocationIndex, envelopes: I) -> Self
    where
        I: IntoIterator<Item = &'a LogEnvelope>,
    {
        let mut folder = Self::default();
        for envelope in envelopes {
            folder.fold(index, envelope);
        }
        folder
    }

    /// Fold one envelope. Envelopes without a result or with an unresolved
    /// parent are ignored.
    pub fn fold(&mut self, index: &InvocationIndex, envelope: &LogEnvelope) {
        let Some(result) = envelope.tool_use_result.as_ref() else {
            return;
        };
        let Some(tool_name) = index.tool_for(envelope.parent_uuid()) else {
            tracing::trace!(parent = envelope.parent_uuid(), "Skipping orphaned tool result");
            return;
        };
        let Some(kind) = ToolKind::classify(tool_name) else {
            return;
        };

        let fields = ResultFields::extract(result);
        let timestamp = envelope.timestamp_millis();

        match kind {
            ToolKind::Read => self.fold_read(fields, timestamp),
            ToolKind::Write => self.fold_write(fields, timestamp),
            ToolKind::Edit => self.fold_diff(fields, timestamp),
            // Counted in the first pass; results carry nothing to detail
            ToolKind::Bash | ToolKind::TodoWrite => {}
        }
    }

    fn fold_read(&mut self, fields: ResultFields, timestamp: i64) {
        if fields.content.is_empty() {
            return;
        }
        let base = self.measured_base(fields.file_path, &fields.content, timestamp);
        self.total_read_characters += base.character_count;
        self.read_details.push(ReadDetail { base });
    }

    fn fold_write(&mut self, fields: ResultFields, timestamp: i64) {
        if fields.content.is_empty() {
            return;
        }
        let base = self.measured_base(fields.file_path, &fields.content, timestamp);
        self.total_write_characters += base.character_count;
        self.total_write_lines += base.line_count;
        self.write_details.push(WriteDetail {
            base,
            content: fields.content,
        });
    }

    fn fold_diff(&mut self, fields: ResultFields, timestamp: i64) {
        if fields.content.is_empty() {
            return;
        }
        let base = self.measured_base(fields.file_path, &fields.content, timestamp);
        self.total_diff_characters += base.character_count;
        self.apply_diff_details.push(ApplyDiffDetail {
            base,
            old_string: fields.old_string,
            new_string: fields.new_string,
        });
    }

    /// Measure `content` and register the file path; called only when a
    /// detail entry is about to be appended.
    fn measured_base(&mut self, file_path: String, content: &str, timestamp: i64) -> DetailBase {
        if !file_path.is_empty() {
            self.unique_files.insert(file_path.clone());
        }
        DetailBase {
            file_path,
            line_count: count_lines(content),
            character_count: count_chars(content),
            timestamp,
        }
    }
}
