//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/claude-analysis/config.toml`, then
//! overridden by environment variables (a `.env` file in the working directory
//! is honored), then by command-line flags applied by the binary.
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/claude-analysis/` (~/.config/claude-analysis/)
//! - State/Logs: `$XDG_STATE_HOME/claude-analysis/` (~/.local/state/claude-analysis/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "claude-analysis";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Telemetry endpoint configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hook input handling
    #[serde(default)]
    pub hook: HookConfig,

    /// Release registry for update checks
    #[serde(default)]
    pub update: UpdateConfig,

    /// Identity fields reported alongside every payload
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Telemetry endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Endpoint that receives the aggregated payload (HTTP POST)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_telemetry_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_telemetry_timeout(),
            max_retries: default_max_retries(),
            accept_invalid_certs: false,
        }
    }
}

impl TelemetryConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(Error::Config("telemetry.endpoint must not be empty".to_string()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::Config(format!(
                "telemetry.endpoint must be an http(s) URL, got {}",
                endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "telemetry.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "http://localhost:8116/o11y/upload_locs".to_string()
}

fn default_telemetry_timeout() -> u64 {
    10
}

fn default_max_retries() -> usize {
    1
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// How standard input is interpreted when no `--path` is given.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    /// Session-end hook: stdin carries `transcript_path`
    #[default]
    Stop,
    /// Per-tool hook: stdin carries the log record(s) themselves
    PostTool,
}

impl HookMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookMode::Stop => "stop",
            HookMode::PostTool => "post_tool",
        }
    }
}

impl std::str::FromStr for HookMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "stop" => Ok(HookMode::Stop),
            "post_tool" => Ok(HookMode::PostTool),
            other => Err(format!("unknown hook mode: {}", other)),
        }
    }
}

/// Hook input configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HookConfig {
    #[serde(default)]
    pub mode: HookMode,
}

/// Release registry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UpdateConfig {
    /// Releases API URL returning a JSON array of releases (Gitea/GitHub style)
    pub releases_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_update_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            releases_url: None,
            timeout_secs: default_update_timeout(),
        }
    }
}

fn default_update_timeout() -> u64 {
    10
}

/// Identity overrides
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// Value of `extensionName` in the payload
    #[serde(default = "default_extension_name")]
    pub extension_name: String,

    /// Overrides the OS user name
    pub user_name: Option<String>,

    /// Overrides the platform machine id
    pub machine_id: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            extension_name: default_extension_name(),
            user_name: None,
            machine_id: None,
        }
    }
}

fn default_extension_name() -> String {
    "Claude-Code".to_string()
}

/// Environment variables that disable TLS verification when truthy.
const INSECURE_TLS_VARS: [&str; 4] = [
    "SKIP_SSL_VERIFY",
    "INSECURE_SKIP_TLS",
    "SSL_VERIFY_DISABLED",
    "TLS_INSECURE",
];

/// Parse a boolean-ish environment value. Unrecognized values yield `None`.
fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from the default path, then apply the process environment.
    ///
    /// Validation is left to the consumers, after command-line overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        // Existing variables win over .env entries
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("O11Y_BASE_URL").filter(|v| !v.trim().is_empty()) {
            tracing::info!(endpoint = %url, "Telemetry endpoint overridden by O11Y_BASE_URL");
            self.telemetry.endpoint = url.trim().to_string();
        }

        let mode = lookup("MODE")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup("mode").filter(|v| !v.trim().is_empty()));
        if let Some(mode) = mode {
            match mode.parse::<HookMode>() {
                Ok(parsed) => self.hook.mode = parsed,
                Err(e) => tracing::warn!("Ignoring MODE from environment: {}", e),
            }
        }

        for var in INSECURE_TLS_VARS {
            if let Some(flag) = lookup(var).as_deref().and_then(parse_env_bool) {
                if flag {
                    self.telemetry.accept_invalid_certs = true;
                    break;
                }
                if var == INSECURE_TLS_VARS[0] {
                    // An explicit "false" on the primary variable pins verification on
                    self.telemetry.accept_invalid_certs = false;
                }
            }
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/claude-analysis/config.toml` (~/.config/claude-analysis/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/claude-analysis/` (~/.local/state/claude-analysis/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }
}
