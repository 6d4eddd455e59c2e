// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fleetdesk_app::{IndexedRow, Row, ScreenKind, Value};
use fleetdesk_testkit::{Fleet, demo_fleet};
use fleetdesk_tui::{FleetAction, TableRuntime, screens};
use serde_json::{Map, Number, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ID_FIELD: &str = "id";
const STATUS_FIELD: &str = "status";

/// Where the records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Demo,
    /// One `<screen>.json` array per screen. Status changes are written back.
    Dir(PathBuf),
}

/// In-memory record store behind the dashboard.
#[derive(Debug)]
pub struct FleetStore {
    source: DataSource,
    fleet: Fleet,
}

impl FleetStore {
    pub fn open(source: DataSource) -> Result<Self> {
        let fleet = match &source {
            DataSource::Demo => demo_fleet(),
            DataSource::Dir(dir) => load_dir(dir)?,
        };
        info!(
            drivers = fleet.drivers.len(),
            buses = fleet.buses.len(),
            routes = fleet.routes.len(),
            trips = fleet.trips.len(),
            "records loaded"
        );
        Ok(Self { source, fleet })
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn rows(&self, screen: ScreenKind) -> &[Row] {
        self.fleet.rows(screen)
    }

    fn position_of(&self, screen: ScreenKind, id: &str) -> Result<usize> {
        self.rows(screen)
            .iter()
            .position(|row| row.get(ID_FIELD).display().as_deref() == Some(id))
            .ok_or_else(|| anyhow!("no {} record with id {id}", screen.as_str()))
    }

    // Every id is resolved before any record changes.
    fn set_status(&mut self, screen: ScreenKind, ids: &[String], status: &str) -> Result<()> {
        let positions = ids
            .iter()
            .map(|id| self.position_of(screen, id))
            .collect::<Result<Vec<_>>>()?;
        let rows = rows_mut(&mut self.fleet, screen);
        for (position, id) in positions.into_iter().zip(ids) {
            rows[position].insert(STATUS_FIELD, status);
            debug!(screen = screen.as_str(), id = %id, status, "status updated");
        }
        Ok(())
    }

    fn persist(&self, screen: ScreenKind) -> Result<()> {
        match &self.source {
            DataSource::Demo => Ok(()),
            DataSource::Dir(dir) => write_rows(&screen_path(dir, screen), self.rows(screen)),
        }
    }
}

impl TableRuntime for FleetStore {
    fn load_rows(&mut self, screen: ScreenKind) -> Result<Vec<Row>> {
        Ok(self.rows(screen).to_vec())
    }

    fn apply_row_action(
        &mut self,
        screen: ScreenKind,
        action: FleetAction,
        row: &IndexedRow,
    ) -> Result<String> {
        let Some(status) = action.target_status() else {
            return Ok(screens::summarize(screen, std::slice::from_ref(&row.row)));
        };
        let id = record_id(screen, &row.row)?;
        self.set_status(screen, std::slice::from_ref(&id), status)?;
        self.persist(screen)?;
        info!(
            screen = screen.as_str(),
            action = action.label(),
            id = %id,
            "row action applied"
        );
        Ok(format!("{} {id}", action.label()))
    }

    fn apply_bulk_action(
        &mut self,
        screen: ScreenKind,
        action: FleetAction,
        rows: &[Row],
    ) -> Result<String> {
        let Some(status) = action.target_status() else {
            return Ok(screens::summarize(screen, rows));
        };
        let ids = rows
            .iter()
            .map(|row| record_id(screen, row))
            .collect::<Result<Vec<_>>>()?;
        self.set_status(screen, &ids, status)?;
        self.persist(screen)?;
        info!(
            screen = screen.as_str(),
            action = action.label(),
            rows = ids.len(),
            "bulk action applied"
        );
        Ok(format!("{}: {} {}", action.label(), ids.len(), screen.as_str()))
    }
}

fn record_id(screen: ScreenKind, row: &Row) -> Result<String> {
    row.get(ID_FIELD)
        .display()
        .ok_or_else(|| anyhow!("{} record has no {ID_FIELD} field", screen.as_str()))
}

fn rows_mut(fleet: &mut Fleet, screen: ScreenKind) -> &mut Vec<Row> {
    match screen {
        ScreenKind::Drivers => &mut fleet.drivers,
        ScreenKind::Buses => &mut fleet.buses,
        ScreenKind::Routes => &mut fleet.routes,
        ScreenKind::Trips => &mut fleet.trips,
    }
}

pub fn screen_path(dir: &Path, screen: ScreenKind) -> PathBuf {
    dir.join(format!("{}.json", screen.as_str()))
}

fn load_dir(dir: &Path) -> Result<Fleet> {
    if !dir.is_dir() {
        bail!(
            "data directory {} does not exist; pass --data <dir>, set [data].dir, or run with --demo",
            dir.display()
        );
    }
    let mut fleet = Fleet::default();
    for screen in ScreenKind::ALL {
        *rows_mut(&mut fleet, screen) = read_rows(&screen_path(dir, screen))?;
    }
    Ok(fleet)
}

/// Reads a JSON array of objects. A missing file is an empty screen.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        debug!(path = %path.display(), "no data file, screen starts empty");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read data file {}", path.display()))?;
    let records: Vec<Map<String, Json>> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "parse data file {}; expected a JSON array of objects",
            path.display()
        )
    })?;
    Ok(records.into_iter().map(row_from_json).collect())
}

fn write_rows(path: &Path, rows: &[Row]) -> Result<()> {
    let records = rows.iter().map(row_to_json).collect::<Vec<_>>();
    let encoded = serde_json::to_string_pretty(&records)
        .with_context(|| format!("encode records for {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("write data file {}", path.display()))
}

fn row_from_json(record: Map<String, Json>) -> Row {
    record
        .into_iter()
        .map(|(field, value)| (field, value_from_json(value)))
        .collect()
}

fn row_to_json(row: &Row) -> Json {
    let record = row
        .fields()
        .map(|(field, value)| (field.to_owned(), value_to_json(value)))
        .collect::<Map<_, _>>();
    Json::Object(record)
}

// Dates stay text; date columns parse ISO text on read.
fn value_from_json(value: Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(flag) => Value::Bool(flag),
        Json::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => Value::Integer(integer),
            (None, Some(decimal)) => Value::Decimal(decimal),
            (None, None) => Value::Text(number.to_string()),
        },
        Json::String(text) => Value::Text(text),
        nested @ (Json::Array(_) | Json::Object(_)) => Value::Text(nested.to_string()),
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(flag) => Json::Bool(*flag),
        Value::Integer(integer) => Json::Number(Number::from(*integer)),
        Value::Decimal(decimal) => Number::from_f64(*decimal)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Text(text) => Json::String(text.clone()),
        Value::Date(date) => Json::String(date.to_string()),
    }
}
