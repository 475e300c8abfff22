//! Hook-mode input handling
//!
//! - `stop`: stdin carries the hook payload; the transcript it names is read
//! - `post_tool`: stdin carries the log records themselves
//!
//! Either way an empty `{}` means there is nothing to report.

use anyhow::{Context, Result};
use claude_analysis_core::config::HookMode;
use claude_analysis_core::ingest::{self, HookInput, RawRecord};

/// What the stdin buffer resolved to.
#[derive(Debug)]
pub enum HookInputs {
    /// Empty payload; emit `{}` and stop
    Nothing,
    Records(Vec<RawRecord>),
}

/// Resolve the stdin buffer into log records for the given mode.
pub fn resolve(mode: HookMode, buffer: &str) -> Result<HookInputs> {
    match mode {
        HookMode::Stop => resolve_stop(buffer),
        HookMode::PostTool => resolve_post_tool(buffer),
    }
}

fn resolve_stop(buffer: &str) -> Result<HookInputs> {
    let input = HookInput::parse(buffer).context("failed to decode hook payload")?;
    if input.is_empty() {
        return Ok(HookInputs::Nothing);
    }

    let path = input
        .transcript_path()
        .context("failed to extract transcript path")?;
    tracing::info!(
        path = %path.display(),
        session_id = input.session_id().unwrap_or(""),
        "Reading transcript"
    );

    let records = ingest::read_jsonl(&path).context("failed to read transcript")?;
    Ok(HookInputs::Records(records))
}

fn resolve_post_tool(buffer: &str) -> Result<HookInputs> {
    if let Ok(record) = ingest::parse_record(buffer) {
        if record.is_empty() {
            return Ok(HookInputs::Nothing);
        }
        return Ok(HookInputs::Records(vec![record]));
    }

    let records = ingest::parse_records(buffer).context("no valid JSON records on stdin")?;
    Ok(HookInputs::Records(records))
}
