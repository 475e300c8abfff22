//! # claude-analysis-core
//!
//! Core library for claude-analysis - a tool-usage reporter for Claude Code
//! sessions.
//!
//! This library provides:
//! - Ingestion of conversation logs (JSONL files, stdin, hook payloads)
//! - The two-pass aggregator producing per-session tool statistics
//! - Telemetry submission and release update checks
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three stages:
//! - **Ingest:** raw lines become [`ingest::RawRecord`]s, then typed
//!   [`ingest::LogEnvelope`]s; malformed input is skipped, never fatal
//! - **Analysis:** the envelopes are indexed and folded into one
//!   [`AnalysisRecord`]; no I/O beyond one repository config read
//! - **Telemetry:** the record is wrapped in an [`AnalysisPayload`] and posted
//!
//! ## Example
//!
//! ```rust,no_run
//! use claude_analysis_core::{analysis, ingest, Config};
//! use std::path::Path;
//!
//! let config = Config::load().expect("failed to load config");
//! let records = ingest::read_jsonl(Path::new("session.jsonl")).expect("failed to read log");
//! for record in analysis::aggregate(records) {
//!     println!("{} tool calls", record.tool_call_counts.total());
//! }
//! # let _ = config;
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use identity::Identity;
pub use types::*;

// Public modules
pub mod analysis;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod logging;
pub mod telemetry;
pub mod types;
pub mod update;
pub mod version;

#[cfg(test)]
mod testing;
