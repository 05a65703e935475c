// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub const APP_NAME: &str = "followup";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_STATUS_CLEAR: &str = "4s";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STATUSES: [&str; 5] = [
    "Waiting for a response",
    "No response",
    "Indecisive",
    "Available",
    "Unavailable",
];
const DEFAULT_CATEGORIES: [&str; 4] = [
    "ABSENT_FOR_A_WHILE",
    "FIRST_TIMER",
    "OUTREACH",
    "SECOND_TIMER",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Service {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub statuses: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub status_clear: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("FOLLOWUP_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set FOLLOWUP_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::read(path)?
        } else {
            Self::default()
        };

        if let Ok(base_url) = env::var("FOLLOWUP_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.service.base_url = Some(base_url);
        }

        config.validate(path)?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version -- add `version = 1` and put values under [service], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if self.base_url().is_empty() {
            bail!(
                "service.base_url in {} must not be empty -- set it to the records service address",
                path.display()
            );
        }

        let timeout = self
            .timeout()
            .with_context(|| format!("service.timeout in {}", path.display()))?;
        if timeout.is_zero() {
            bail!(
                "service.timeout in {} must be positive, got {}",
                path.display(),
                self.service.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT)
            );
        }

        self.status_clear()
            .with_context(|| format!("ui.status_clear in {}", path.display()))?;

        if self.statuses().is_empty() {
            bail!(
                "ui.statuses in {} must list at least one status",
                path.display()
            );
        }
        if self
            .statuses()
            .iter()
            .chain(self.categories().iter())
            .any(|label| label.trim().is_empty())
        {
            bail!(
                "ui.statuses and ui.categories in {} must not contain blank labels",
                path.display()
            );
        }

        self.log_level()
            .with_context(|| format!("log.level in {}", path.display()))?;
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.service
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.service.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    /// Zero disables auto-clear.
    pub fn status_clear(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .status_clear
                .as_deref()
                .unwrap_or(DEFAULT_STATUS_CLEAR),
        )
    }

    pub fn statuses(&self) -> Vec<String> {
        match &self.ui.statuses {
            Some(statuses) => statuses.clone(),
            None => DEFAULT_STATUSES.map(str::to_owned).to_vec(),
        }
    }

    pub fn categories(&self) -> Vec<String> {
        match &self.ui.categories {
            Some(categories) => categories.clone(),
            None => DEFAULT_CATEGORIES.map(str::to_owned).to_vec(),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        let raw = self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
        LevelFilter::from_str(raw).map_err(|_| {
            anyhow!("invalid log level {raw:?}; use one of: off, error, warn, info, debug, trace")
        })
    }

    pub fn log_level_is_set(&self) -> bool {
        self.log.level.is_some()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_deref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        let quoted = |labels: &[&str]| {
            labels
                .iter()
                .map(|label| format!("\"{label}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "# followup config\n# Place this file at: {}\n\nversion = 1\n\n[service]\n# FOLLOWUP_BASE_URL overrides this value when set\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\nstatuses = [{}]\ncategories = [{}]\n# success messages clear after this long; \"0s\" keeps them\nstatus_clear = \"{}\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/followup/followup.log)\n# file = \"/absolute/path/to/followup.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            quoted(&DEFAULT_STATUSES[..]),
            quoted(&DEFAULT_CATEGORIES[..]),
            DEFAULT_STATUS_CLEAR,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].file in the config"))?;
    Ok(data_root.join(APP_NAME).join("followup.log"))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
