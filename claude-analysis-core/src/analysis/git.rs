//! Repository probe
//!
//! Reads `<cwd>/.git/config` and extracts the `origin` remote URL. The probe
//! never fails: a missing file, an unreadable file or a config without an
//! `origin` remote all yield an empty string.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const ORIGIN_SECTION: &str = r#"[remote "origin"]"#;

/// Source of a working directory's remote URL.
pub trait RemoteProbe {
    /// Remote URL for the repository at `cwd`, or an empty string.
    fn remote_url(&self, cwd: &Path) -> String;
}

/// Probe that scans the local `.git/config` file.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitConfigProbe;

impl RemoteProbe for GitConfigProbe {
    fn remote_url(&self, cwd: &Path) -> String {
        origin_url(cwd)
    }
}

/// Extract `remote.origin.url` from `<cwd>/.git/config`.
pub fn origin_url(cwd: &Path) -> String {
    if cwd.as_os_str().is_empty() {
        return String::new();
    }

    let config_path = cwd.join(".git").join("config");
    let file = match File::open(&config_path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %config_path.display(), error = %e, "No repository config");
            return String::new();
        }
    };

    let mut in_origin = false;
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else {
            return String::new();
        };
        let line = line.trim();

        if line.starts_with('[') && line.ends_with(']') {
            in_origin = line == ORIGIN_SECTION;
            continue;
        }

        if in_origin {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim() == "url" {
                    return value.trim().to_string();
                }
            }
        }
    }

    String::new()
}
