//! Ingestion layer: from bytes on disk or stdin to typed log envelopes
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ JSONL file/stdin │ ──► │ reader       │ ──► │ record       │ ──► analysis
//! │ (hook payload)   │     │ (RawRecord)  │     │ (LogEnvelope)│
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Malformed input is tolerated at every step below the I/O layer: bad lines
//! are skipped by the reader, records that fail projection are dropped by the
//! aggregator. Only I/O failures and undecodable hook payloads are errors.

mod hook;
mod reader;
pub mod record;

pub use hook::HookInput;
pub use reader::{parse_record, parse_records, read_jsonl, JsonlRecords};
pub use record::{LogEnvelope, ToolUse};

/// A raw log record: an unstructured JSON object.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
