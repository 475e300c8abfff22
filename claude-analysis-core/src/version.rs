//! Build and version information.

use serde::Serialize;
use std::cmp::Ordering;

/// Version of this crate, as released.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build metadata, logged when the binary starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_time: &'static str,
}

/// Version info; commit and build time come from `CLAUDE_ANALYSIS_GIT_COMMIT`
/// and `CLAUDE_ANALYSIS_BUILD_TIME` at compile time.
pub fn info() -> VersionInfo {
    VersionInfo {
        version: VERSION,
        git_commit: option_env!("CLAUDE_ANALYSIS_GIT_COMMIT").unwrap_or("unknown"),
        build_time: option_env!("CLAUDE_ANALYSIS_BUILD_TIME").unwrap_or("unknown"),
    }
}

/// Whether `latest` is a newer release than `current`.
///
/// A leading `v` and any pre-release suffix (`-rc.1`) are ignored; missing
/// components count as 0. Either side failing to parse yields `false`.
pub fn is_newer_version(current: &str, latest: &str) -> bool {
    match (parse_version(current), parse_version(latest)) {
        (Some(current), Some(latest)) => compare(&latest, &current) == Ordering::Greater,
        _ => false,
    }
}

fn parse_version(version: &str) -> Option<Vec<u64>> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let core = version.split('-').next().unwrap_or_default();
    if core.is_empty() {
        return None;
    }
    core.split('.').map(|part| part.parse().ok()).collect()
}

fn compare(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
