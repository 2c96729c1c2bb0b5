//! Endpoint URL configuration.
//!
//! The webhook and storage URLs can come from a command line flag, the
//! process environment, or the `env` map in
//! $HOME/.release-herald/settings.json, checked in that order. The settings
//! file keeps long-lived URLs out of every invocation.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the webhook endpoint URL.
pub const WEBHOOK_URL_VAR: &str = "RELEASE_HERALD_WEBHOOK_URL";

/// Environment variable naming the base URL exported reports are served from.
pub const STORAGE_URL_VAR: &str = "RELEASE_HERALD_STORAGE_URL";

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    /// Environment variable fallbacks.
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Resolves an endpoint URL: an explicit flag wins, then the process
/// environment, then the settings file. Returns `None` when no source
/// provides a value; only an unreadable settings file is an error.
pub fn resolve_url(flag: Option<String>, var: &str) -> Result<Option<String>> {
    if let Some(value) = flag {
        return Ok(Some(value));
    }

    if let Ok(value) = env::var(var) {
        return Ok(Some(value));
    }

    let settings = load_settings()?;
    Ok(settings.env.get(var).cloned())
}

fn load_settings() -> Result<SettingsFile> {
    // Without a home directory there is no settings file to consult
    let Some(home_dir) = dirs::home_dir() else {
        return Ok(SettingsFile::default());
    };

    load_from_path(home_dir.join(".release-herald").join("settings.json"))
}

fn load_from_path<P: AsRef<Path>>(path: P) -> Result<SettingsFile> {
    let path = path.as_ref();

    // A missing file just means nothing is configured
    if !path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    serde_json::from_str::<SettingsFile>(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}
