//! Telemetry submission
//!
//! Posts the [`AnalysisPayload`](crate::types::AnalysisPayload) to the
//! configured endpoint. Submission happens only after aggregation has
//! finished; the aggregator never touches the network.
//!
//! Configure the endpoint in `~/.config/claude-analysis/config.toml`:
//!
//! ```toml
//! [telemetry]
//! endpoint = "https://o11y.example.com/o11y/upload_locs"
//! timeout_secs = 10
//! max_retries = 1
//! ```
//!
//! or with `O11Y_BASE_URL` / `--o11y_base_url`.

mod client;

pub use client::{SubmitResponse, SyncTelemetryClient, TelemetryClient};
