//! Core domain types for claude-analysis
//!
//! These types form the output document of an aggregation: per-invocation
//! detail entries, per-tool call counts, the per-session aggregate record and
//! the payload submitted to the telemetry endpoint.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tool kind** | A recognized tool name: Read, Write, Edit, Bash, TodoWrite |
//! | **Detail entry** | One per-invocation datum: read, write, apply-diff or run-command |
//! | **Aggregate record** | The single statistics document produced per session |
//! | **Payload** | The aggregate records plus user/machine context, as submitted |
//!
//! Field names serialize in camelCase to match the telemetry wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Tool kinds
// ============================================

/// The closed set of tools that produce detail entries or dedicated counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Read,
    Write,
    /// Edits and patches (`Edit`, `ApplyDiff`, `apply_diff`, `ApplyPatch`)
    Edit,
    Bash,
    TodoWrite,
}

impl ToolKind {
    /// All recognized kinds, in reporting order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Read,
        ToolKind::Write,
        ToolKind::Edit,
        ToolKind::TodoWrite,
        ToolKind::Bash,
    ];

    /// Canonical tool name as it appears in assistant logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Read => "Read",
            ToolKind::Write => "Write",
            ToolKind::Edit => "Edit",
            ToolKind::Bash => "Bash",
            ToolKind::TodoWrite => "TodoWrite",
        }
    }

    /// Classify a tool name, ignoring case. Unknown names yield `None`.
    pub fn classify(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "read" => Some(ToolKind::Read),
            "write" => Some(ToolKind::Write),
            "edit" | "applydiff" | "apply_diff" | "applypatch" => Some(ToolKind::Edit),
            "bash" => Some(ToolKind::Bash),
            "todowrite" | "todo_write" => Some(ToolKind::TodoWrite),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Detail entries
// ============================================

/// Fields shared by every detail entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailBase {
    /// File touched by the invocation (working directory for commands)
    pub file_path: String,
    /// Lines in the measured text; always 0 for commands
    pub line_count: usize,
    /// Unicode code points in the measured text
    pub character_count: usize,
    /// Unix milliseconds of the producing record, 0 when unknown
    pub timestamp: i64,
}

/// A file written by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteDetail {
    #[serde(flatten)]
    pub base: DetailBase,
    /// Full written text
    pub content: String,
}

/// A file read by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadDetail {
    #[serde(flatten)]
    pub base: DetailBase,
}

/// An edit or patch applied by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiffDetail {
    #[serde(flatten)]
    pub base: DetailBase,
    pub old_string: String,
    pub new_string: String,
}

/// A shell command run by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCommandDetail {
    #[serde(flatten)]
    pub base: DetailBase,
    pub command: String,
    pub description: String,
}

// ============================================
// Tool call counts
// ============================================

/// Number of tool-use blocks observed per tool name.
///
/// The recognized kinds are always present (0 when unseen); any other name is
/// added the first time it is observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallCounts(BTreeMap<String, usize>);

impl Default for ToolCallCounts {
    fn default() -> Self {
        Self(
            ToolKind::ALL
                .iter()
                .map(|kind| (kind.as_str().to_string(), 0))
                .collect(),
        )
    }
}

impl ToolCallCounts {
    /// Record one tool-use block with the given name.
    pub fn increment(&mut self, name: &str) {
        *self.0.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Count for a tool name (exact match), 0 when unseen.
    pub fn get(&self, name: &str) -> usize {
        self.0.get(name).copied().unwrap_or(0)
    }

    /// Count for a recognized kind under its canonical name.
    pub fn of(&self, kind: ToolKind) -> usize {
        self.get(kind.as_str())
    }

    /// Sum over every tool name.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

// ============================================
// Aggregate record and payload
// ============================================

/// Aggregated statistics for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub total_unique_files: usize,
    pub total_write_lines: usize,
    pub total_read_characters: usize,
    pub total_write_characters: usize,
    pub total_diff_characters: usize,
    pub write_to_file_details: Vec<WriteDetail>,
    pub read_file_details: Vec<ReadDetail>,
    pub apply_diff_details: Vec<ApplyDiffDetail>,
    pub run_command_details: Vec<RunCommandDetail>,
    pub tool_call_counts: ToolCallCounts,
    /// Session identifier (first non-empty seen)
    pub task_id: String,
    /// Maximum record timestamp, Unix milliseconds
    pub timestamp: i64,
    /// Working directory (first non-empty seen)
    pub folder_path: String,
    /// `origin` remote of the working directory's repository, or empty
    pub git_remote_url: String,
}

/// Document submitted to the telemetry endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub user: String,
    pub records: Vec<AnalysisRecord>,
    pub extension_name: String,
    pub machine_id: String,
    pub insights_version: String,
}
