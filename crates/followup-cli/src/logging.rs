// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::{Config, default_log_path};
use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stderr(LevelFilter),
    File(PathBuf, LevelFilter),
}

/// The terminal UI owns stdout and stderr, so interactive runs always log to
/// a file. Batch runs use stderr only when a level was asked for.
pub fn log_target(config: &Config, interactive: bool) -> Result<LogTarget> {
    let level = config.log_level()?;
    if level == LevelFilter::OFF {
        return Ok(LogTarget::Off);
    }
    let target = match config.log_file() {
        Some(path) => LogTarget::File(path, level),
        None if interactive => LogTarget::File(default_log_path()?, level),
        None if config.log_level_is_set() => LogTarget::Stderr(level),
        None => LogTarget::Off,
    };
    Ok(target)
}

/// Installs the global subscriber. Failures leave logging off.
pub fn init(config: &Config, interactive: bool) {
    if let Err(error) = try_init(config, interactive)
        && !interactive
    {
        eprintln!("logging disabled: {error:#}");
    }
}

fn try_init(config: &Config, interactive: bool) -> Result<()> {
    match log_target(config, interactive)? {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr(level) => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|error| anyhow!("install log subscriber: {error}")),
        LogTarget::File(path, level) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|error| anyhow!("install log subscriber: {error}"))
        }
    }
}
