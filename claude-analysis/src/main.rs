//! claude-analysis - tool-usage reporter for Claude Code sessions
//!
//! Runs in one of three ways:
//! - As a hook (default): reads stdin, aggregates the session log and submits
//!   the result to the telemetry endpoint, printing the endpoint's response
//! - As an offline analyzer (`--path`): aggregates a JSONL log and prints the
//!   payload without submitting it
//! - As an update probe (`--check-update`)
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/claude-analysis/config.toml (~/.config/claude-analysis/config.toml)
//! - Logs: $XDG_STATE_HOME/claude-analysis/ (~/.local/state/claude-analysis/)

mod hook;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use claude_analysis_core::telemetry::SyncTelemetryClient;
use claude_analysis_core::update::{self, UpdateResult};
use claude_analysis_core::{analysis, ingest, logging, version, Config, Identity};
use claude_analysis_core::{AnalysisPayload, AnalysisRecord};
use hook::HookInputs;
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How long a finished run waits for the background update check.
const UPDATE_REPORT_WAIT: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "claude-analysis")]
#[command(about = "Report tool usage of Claude Code sessions")]
#[command(version)]
struct Args {
    /// Analyze this JSONL session log instead of reading stdin
    #[arg(long)]
    path: Option<PathBuf>,

    /// Write the JSON result to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Check the release registry for a newer version and exit
    #[arg(long)]
    check_update: bool,

    /// Do not check for a newer version in the background
    #[arg(long)]
    skip_update_check: bool,

    /// Telemetry endpoint (overrides config and O11Y_BASE_URL)
    #[arg(long = "o11y_base_url", value_name = "URL")]
    o11y_base_url: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => return fail(e),
    };

    // Logging is best-effort; the guard must outlive the error report below
    let _log_guard = logging::init(&config.logging).ok();
    let build = version::info();
    tracing::info!(
        version = build.version,
        git_commit = build.git_commit,
        build_time = build.build_time,
        mode = config.hook.mode.as_str(),
        "claude-analysis starting"
    );

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(e: anyhow::Error) -> ExitCode {
    tracing::error!("{:#}", e);
    let report = json!({"status": "error", "message": format!("{:#}", e)});
    eprintln!("{}", report);
    ExitCode::FAILURE
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = args.o11y_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
        config.telemetry.endpoint = url.trim().to_string();
    }
    Ok(config)
}

fn run(args: Args, config: Config) -> Result<()> {
    if args.check_update {
        let result = update::check_for_updates_blocking(&config.update);
        return output::emit(&result, args.output.as_deref());
    }

    let update_probe = if args.skip_update_check || config.update.releases_url.is_none() {
        None
    } else {
        Some(spawn_update_probe(&config))
    };

    let identity = Identity::resolve(&config.identity);

    let document = match args.path {
        Some(ref path) => {
            let records = ingest::read_jsonl(path).context("failed to read session log")?;
            let payload = build_payload(&identity, analysis::aggregate(records));
            serde_json::to_value(&payload).context("failed to serialize payload")?
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;

            match hook::resolve(config.hook.mode, &buffer)? {
                HookInputs::Nothing => {
                    tracing::info!("Empty hook payload, nothing to report");
                    json!({})
                }
                HookInputs::Records(records) => {
                    let payload = build_payload(&identity, analysis::aggregate(records));
                    submit(&config, &identity, &payload)?
                }
            }
        }
    };

    output::emit(&document, args.output.as_deref())?;

    if let Some(probe) = update_probe {
        report_update(probe);
    }
    Ok(())
}

fn build_payload(identity: &Identity, records: Vec<AnalysisRecord>) -> AnalysisPayload {
    AnalysisPayload {
        user: identity.user_name.clone(),
        records,
        extension_name: identity.extension_name.clone(),
        machine_id: identity.machine_id.clone(),
        insights_version: version::VERSION.to_string(),
    }
}

fn submit(config: &Config, identity: &Identity, payload: &AnalysisPayload) -> Result<Value> {
    let client = SyncTelemetryClient::new(config.telemetry.clone(), &identity.user_name)
        .context("failed to create telemetry client")?;
    let response = client
        .submit(payload)
        .with_context(|| format!("API call failed (endpoint: {})", client.endpoint()))?;
    Ok(Value::Object(response))
}

fn spawn_update_probe(config: &Config) -> Receiver<UpdateResult> {
    let update_config = config.update.clone();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(update::check_for_updates_blocking(&update_config));
    });
    rx
}

/// Report a newer release if the background check has finished in time.
fn report_update(probe: Receiver<UpdateResult>) {
    match probe.recv_timeout(UPDATE_REPORT_WAIT) {
        Ok(result) if result.has_update => {
            eprintln!(
                "A new version of claude-analysis is available: {} -> {}",
                result.current_version, result.latest_version
            );
        }
        Ok(_) => {}
        Err(RecvTimeoutError::Timeout) => {
            tracing::debug!("Update check still running, not reporting");
        }
        Err(RecvTimeoutError::Disconnected) => tracing::warn!("Update check panicked"),
    }
}
