// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{DEFAULT_DATE_FORMAT, DateStyle};
use fleetdesk_tui::TableSettings;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "fleetdesk";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "fleetdesk.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub table: TableSection,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            table: TableSection::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSection {
    pub rows_per_page: Option<usize>,
    pub page_sizes: Option<Vec<usize>>,
    pub virtualize: Option<bool>,
    pub row_height: Option<u32>,
    pub overscan: Option<usize>,
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("FLEETDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set FLEETDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [data], [table], and [logging]",
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

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let page_sizes = self.page_sizes();
        if page_sizes.is_empty() {
            bail!("table.page_sizes in {} must not be empty", path.display());
        }
        if let Some(zero) = page_sizes.iter().find(|size| **size == 0) {
            bail!(
                "table.page_sizes in {} must all be positive, got {}",
                path.display(),
                zero
            );
        }

        if let Some(rows_per_page) = self.table.rows_per_page
            && !page_sizes.contains(&rows_per_page)
        {
            bail!(
                "table.rows_per_page = {} in {} is not one of table.page_sizes {:?}",
                rows_per_page,
                path.display(),
                page_sizes
            );
        }

        if self.table.row_height == Some(0) {
            bail!("table.row_height in {} must be positive", path.display());
        }

        if let Some(format) = &self.table.date_format {
            DateStyle::parse(format).with_context(|| {
                format!(
                    "table.date_format in {}; use a description like \"{}\"",
                    path.display(),
                    DEFAULT_DATE_FORMAT
                )
            })?;
        }

        if let Some(level) = &self.logging.level {
            level.parse::<tracing::Level>().map_err(|_| {
                anyhow!(
                    "logging.level in {} must be one of trace, debug, info, warn, error; got {:?}",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data.dir.as_deref().map(PathBuf::from)
    }

    fn page_sizes(&self) -> Vec<usize> {
        self.table
            .page_sizes
            .clone()
            .unwrap_or_else(|| TableSettings::default().page_sizes)
    }

    pub fn table_settings(&self) -> Result<TableSettings> {
        let defaults = TableSettings::default();
        let page_sizes = self.page_sizes();
        let rows_per_page = self
            .table
            .rows_per_page
            .unwrap_or(if page_sizes.contains(&defaults.rows_per_page) {
                defaults.rows_per_page
            } else {
                page_sizes.first().copied().unwrap_or(defaults.rows_per_page)
            });
        let date_style = match &self.table.date_format {
            Some(format) => DateStyle::parse(format)?,
            None => defaults.date_style,
        };
        Ok(TableSettings {
            rows_per_page,
            page_sizes,
            virtualize: self.table.virtualize.unwrap_or(defaults.virtualize),
            row_height: self.table.row_height.unwrap_or(defaults.row_height),
            overscan: self.table.overscan.unwrap_or(defaults.overscan),
            date_style,
        })
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.logging.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [logging].file in the config")
        })?;
        Ok(data_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        let defaults = TableSettings::default();
        format!(
            "# fleetdesk config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Directory holding drivers.json, buses.json, routes.json and trips.json\n# dir = \"/absolute/path/to/fleet\"\n\n[table]\nrows_per_page = {}\npage_sizes = {:?}\nvirtualize = false\nrow_height = {}\noverscan = {}\ndate_format = \"{}\"\n\n[logging]\nlevel = \"{}\"\n# file = \"/absolute/path/to/fleetdesk.log\"\n",
            path.display(),
            defaults.rows_per_page,
            defaults.page_sizes,
            defaults.row_height,
            defaults.overscan,
            DEFAULT_DATE_FORMAT,
            DEFAULT_LOG_LEVEL,
        )
    }
}
