//! Configuration lifecycle: load optional file config, merge CLI overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use tabrip_core::DEFAULT_FETCH_TIMEOUT_SECS;

use crate::cli::Args;

/// Optional on-disk configuration. Every field mirrors a CLI flag; CLI
/// values win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub headless: Option<bool>,
    pub delay_ms: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
}

/// Loads the config file from `explicit` when given, otherwise from the
/// default location under `$XDG_CONFIG_HOME`. A missing default file is not
/// an error; a missing explicit file is.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(base) = std::env::var_os("XDG_CONFIG_HOME") else {
                return Ok(FileConfig::default());
            };
            let path = PathBuf::from(base).join("tabrip").join("config.json");
            if !path.exists() {
                return Ok(FileConfig::default());
            }
            path
        }
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Resolved settings bundle consumed by `main`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub headless: bool,
    pub delay_override: Option<Duration>,
    pub fetch_timeout: Duration,
}

impl Settings {
    /// Merges CLI flags over the file config over built-in defaults.
    pub fn resolve(args: &Args, file: &FileConfig) -> Self {
        Self {
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            headless: args.headless.or(file.headless).unwrap_or(true),
            delay_override: args
                .delay
                .or(file.delay_ms)
                .map(Duration::from_millis),
            fetch_timeout: Duration::from_secs(
                args.fetch_timeout
                    .or(file.fetch_timeout_secs)
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
        }
    }
}
