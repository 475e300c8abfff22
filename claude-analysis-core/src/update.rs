//! Update probe against a release registry
//!
//! The registry returns a JSON array of releases (Gitea and GitHub both use
//! this shape). The newest published, non-draft, non-prerelease entry is
//! compared with the running version.
//!
//! A registry failure never fails the caller: it is reported in
//! [`UpdateResult::error`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::UpdateConfig;
use crate::error::{Error, Result};
use crate::version::{self, is_newer_version};

/// One entry of the registry's release list.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

/// Outcome of an update probe, printed by `--check-update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub has_update: bool,
    pub current_version: String,
    pub latest_version: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResult {
    fn failed(current: &str, error: &Error) -> Self {
        Self {
            has_update: false,
            current_version: current.to_string(),
            latest_version: String::new(),
            message: "Unable to check for updates, continuing with current version".to_string(),
            error: Some(error.to_string()),
        }
    }

    fn compared(current: &str, latest: &str) -> Self {
        let has_update = is_newer_version(current, latest);
        let message = if has_update {
            format!("New version available: {} -> {}", current, latest)
        } else {
            "Already using the latest version".to_string()
        };
        Self {
            has_update,
            current_version: current.to_string(),
            latest_version: latest.to_string(),
            message,
            error: None,
        }
    }
}

/// Probe the registry for a release newer than the running version.
pub async fn check_for_updates(config: &UpdateConfig) -> UpdateResult {
    check_against(config, version::VERSION).await
}

/// Blocking variant of [`check_for_updates`].
pub fn check_for_updates_blocking(config: &UpdateConfig) -> UpdateResult {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = Error::Update(format!("failed to create runtime: {}", e));
            return UpdateResult::failed(version::VERSION, &error);
        }
    };
    runtime.block_on(check_for_updates(config))
}

async fn check_against(config: &UpdateConfig, current: &str) -> UpdateResult {
    match latest_release(config).await {
        Ok(release) => {
            tracing::debug!(tag = %release.tag_name, name = %release.name, "Latest release");
            UpdateResult::compared(current, &release.tag_name)
        }
        Err(e) => {
            tracing::warn!("Update check failed: {}", e);
            UpdateResult::failed(current, &e)
        }
    }
}

async fn latest_release(config: &UpdateConfig) -> Result<Release> {
    let url = config
        .releases_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| Error::Update("no release registry configured".to_string()))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Error::Update(format!("failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Update(format!("failed to fetch releases: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Update(format!(
            "API request failed with status: {}",
            status.as_u16()
        )));
    }

    let releases: Vec<Release> = response
        .json()
        .await
        .map_err(|e| Error::Update(format!("failed to decode releases: {}", e)))?;

    releases
        .into_iter()
        .find(|release| !release.draft && !release.prerelease)
        .ok_or_else(|| Error::Update("no releases found".to_string()))
}
