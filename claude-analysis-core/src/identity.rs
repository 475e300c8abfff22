//! User and machine identity reported with each payload.

use crate::config::IdentityConfig;

const UNKNOWN_USER: &str = "unknown";
const UNKNOWN_MACHINE: &str = "unknown-machine-id";

/// Resolved identity fields for the submission payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_name: String,
    pub machine_id: String,
    pub extension_name: String,
}

impl Identity {
    /// Resolve identity from config overrides, the environment and the platform.
    pub fn resolve(config: &IdentityConfig) -> Self {
        let user_name = config
            .user_name
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(current_user_name);
        let machine_id = config
            .machine_id
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(machine_id);

        Self {
            user_name,
            machine_id,
            extension_name: config.extension_name.clone(),
        }
    }
}

/// Current OS user name, or `"unknown"`.
pub fn current_user_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}

/// Platform machine id, or `"unknown-machine-id"`.
pub fn machine_id() -> String {
    platform_machine_id().unwrap_or_else(|| {
        tracing::debug!("No platform machine id available");
        UNKNOWN_MACHINE.to_string()
    })
}

#[cfg(target_os = "linux")]
fn platform_machine_id() -> Option<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id"]
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
}

#[cfg(target_os = "macos")]
fn platform_machine_id() -> Option<String> {
    use std::process::Command;

    let output = Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find(|line| line.contains("IOPlatformUUID"))
        .and_then(|line| line.split('"').nth(3))
        .map(|uuid| uuid.to_string())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn platform_machine_id() -> Option<String> {
    // MachineGuid lives in the registry on Windows; a file fallback covers containers.
    std::fs::read_to_string("/etc/machine-id")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}
