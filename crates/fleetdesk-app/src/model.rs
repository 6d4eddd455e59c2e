// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::{Date, OffsetDateTime};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenKind {
    Drivers,
    Buses,
    Routes,
    Trips,
}

impl ScreenKind {
    pub const ALL: [Self; 4] = [Self::Drivers, Self::Buses, Self::Routes, Self::Trips];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Drivers => "Drivers",
            Self::Buses => "Buses",
            Self::Routes => "Routes",
            Self::Trips => "Trips",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drivers => "drivers",
            Self::Buses => "buses",
            Self::Routes => "routes",
            Self::Trips => "trips",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "drivers" => Some(Self::Drivers),
            "buses" => Some(Self::Buses),
            "routes" => Some(Self::Routes),
            "trips" => Some(Self::Trips),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Active sort. `key == None` keeps upstream order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }
}

/// A dynamically typed record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Date(Date),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String form used by search and plain rendering. `Null` has none.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Decimal(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
            Self::Date(value) => Some(value.to_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Integer(value) => *value != 0,
            Self::Decimal(value) => *value != 0.0 && !value.is_nan(),
            Self::Text(value) => !value.is_empty(),
            Self::Date(_) => true,
        }
    }

    /// Numeric reading with loose coercion: booleans count as 0/1 and
    /// numeric text parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::Integer(value) => Some(*value as f64),
            Self::Decimal(value) => Some(*value),
            Self::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            Self::Null | Self::Date(_) => None,
        }
    }

    /// Numeric reading that also accepts currency text like `$1,200.50`.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Self::Text(value) => {
                let cleaned: String = value
                    .trim()
                    .chars()
                    .filter(|ch| !matches!(ch, '$' | ',' | ' '))
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok()
                }
            }
            other => other.as_number(),
        }
    }

    /// Calendar date reading. Text may be `YYYY-MM-DD` or RFC 3339.
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(value) => Some(*value),
            Self::Text(value) => parse_date_text(value.trim()),
            _ => None,
        }
    }
}

fn parse_date_text(raw: &str) -> Option<Date> {
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(date);
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .map(OffsetDateTime::date)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// An opaque record: field name to value. Missing fields read as `Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (field, value) in iter {
            row.insert(field, value);
        }
        row
    }
}

/// A row handed to a row action, merged with its page position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRow {
    pub row: Row,
    pub index: usize,
}

impl IndexedRow {
    pub fn get(&self, field: &str) -> &Value {
        self.row.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, ScreenKind, SortDirection, Value};
    use time::macros::date;

    #[test]
    fn missing_field_reads_null() {
        let row = Row::new().with("name", "Amy");
        assert_eq!(row.get("name"), &Value::Text("Amy".to_owned()));
        assert!(row.get("age").is_null());
    }

    #[test]
    fn display_matches_host_string_forms() {
        assert_eq!(Value::Integer(5).display().as_deref(), Some("5"));
        assert_eq!(Value::Decimal(5.0).display().as_deref(), Some("5"));
        assert_eq!(Value::Decimal(1.5).display().as_deref(), Some("1.5"));
        assert_eq!(Value::Bool(true).display().as_deref(), Some("true"));
        assert_eq!(
            Value::Date(date!(2026 - 03 - 07)).display().as_deref(),
            Some("2026-03-07")
        );
        assert_eq!(Value::Null.display(), None);
    }

    #[test]
    fn truthiness_follows_loose_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Decimal(f64::NAN).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Text("no".to_owned()).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
    }

    #[test]
    fn numeric_and_amount_readings() {
        assert_eq!(Value::from("42").as_number(), Some(42.0));
        assert_eq!(Value::from(" ").as_number(), None);
        assert_eq!(Value::from("$1,200.50").as_amount(), Some(1200.5));
        assert_eq!(Value::from("abc").as_amount(), None);
    }

    #[test]
    fn date_text_parses_plain_and_rfc3339() {
        assert_eq!(
            Value::from("2026-01-31").as_date(),
            Some(date!(2026 - 01 - 31))
        );
        assert_eq!(
            Value::from("2026-01-31T08:15:00Z").as_date(),
            Some(date!(2026 - 01 - 31))
        );
        assert_eq!(Value::from("yesterday").as_date(), None);
    }

    #[test]
    fn option_into_value_maps_none_to_null() {
        let row = Row::new().with("plate", None::<String>);
        assert!(row.get("plate").is_null());
        assert!(row.contains("plate"));
    }

    #[test]
    fn screen_kind_round_trips_through_str() {
        for screen in ScreenKind::ALL {
            assert_eq!(ScreenKind::parse(screen.as_str()), Some(screen));
        }
        assert_eq!(ScreenKind::parse("depots"), None);
    }

    #[test]
    fn sort_direction_toggles() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
    }
}
