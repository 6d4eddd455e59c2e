// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "FLEETDESK_LOG";

/// Builds the filter from `FLEETDESK_LOG` when set, else from `default_level`.
fn env_filter(default_level: &str) -> Result<EnvFilter> {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_owned());
    EnvFilter::builder()
        .parse(&directives)
        .with_context(|| {
            format!("invalid log filter {directives:?}; check {LOG_ENV} or [logging].level")
        })
}

/// Sends tracing output to `path`. The terminal belongs to the TUI, so
/// nothing is written to stdout or stderr.
pub fn init(path: &Path, default_level: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(env_filter(default_level)?);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("install log subscriber")
}

#[cfg(test)]
mod tests {
    use super::env_filter;
    use anyhow::Result;

    #[test]
    fn config_level_parses_as_filter() -> Result<()> {
        let filter = env_filter("debug")?;
        assert!(filter.to_string().contains("debug"));
        Ok(())
    }

    #[test]
    fn garbage_filter_is_rejected() {
        let error = env_filter("fleetdesk=notalevel").expect_err("bad directive should fail");
        assert!(error.to_string().contains("invalid log filter"));
    }
}
