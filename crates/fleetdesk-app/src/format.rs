// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use time::Date;
use time::format_description::{self, OwnedFormatItem};

use crate::{Column, ColumnType, Row, Value};

pub const PLACEHOLDER: &str = "-";
pub const DEFAULT_DATE_FORMAT: &str = "[month padding:none]/[day padding:none]/[year]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Neutral,
}

/// Output of the cell formatter, independent of any drawing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Placeholder,
    Badge { tone: Tone, label: String },
    Glyph { tone: Tone },
}

impl Rendered {
    pub fn text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Placeholder => PLACEHOLDER.to_owned(),
            Self::Badge { label, .. } => label.clone(),
            Self::Glyph { tone: Tone::Success } => "✓".to_owned(),
            Self::Glyph { .. } => "✗".to_owned(),
        }
    }

    pub const fn tone(&self) -> Option<Tone> {
        match self {
            Self::Badge { tone, .. } | Self::Glyph { tone } => Some(*tone),
            Self::Text(_) | Self::Placeholder => None,
        }
    }
}

/// Short date layout used by date columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStyle {
    items: OwnedFormatItem,
}

impl DateStyle {
    pub fn parse(description: &str) -> Result<Self> {
        let items = format_description::parse_owned::<2>(description)
            .with_context(|| format!("invalid date format description {description:?}"))?;
        Ok(Self { items })
    }

    pub fn format(&self, date: Date) -> Option<String> {
        date.format(&self.items).ok()
    }
}

impl Default for DateStyle {
    fn default() -> Self {
        let items = format_description::parse_owned::<2>(DEFAULT_DATE_FORMAT)
            .unwrap_or_else(|_| OwnedFormatItem::Compound(Box::new([])));
        Self { items }
    }
}

pub fn format_cell(row: &Row, column: &Column, dates: &DateStyle) -> Rendered {
    let value = row.get(&column.field);
    if let Some(render) = &column.render {
        return render(value, row);
    }

    match column.kind {
        ColumnType::Status => format_status(value),
        ColumnType::Boolean => Rendered::Glyph {
            tone: if value.is_truthy() {
                Tone::Success
            } else {
                Tone::Error
            },
        },
        ColumnType::Currency => format_currency(value),
        ColumnType::Date => format_date(value, dates),
        ColumnType::Plain => format_plain(value),
    }
}

pub fn status_tone(label: &str) -> Tone {
    match label.to_lowercase().as_str() {
        "active" | "completed" => Tone::Success,
        "inactive" | "cancelled" => Tone::Error,
        "pending" => Tone::Warning,
        _ => Tone::Neutral,
    }
}

fn format_status(value: &Value) -> Rendered {
    match value.display() {
        Some(label) if !label.is_empty() => Rendered::Badge {
            tone: status_tone(&label),
            label,
        },
        _ => Rendered::Placeholder,
    }
}

// Always USD; a row's own currency field is not consulted.
fn format_currency(value: &Value) -> Rendered {
    if value.is_null() {
        return Rendered::Placeholder;
    }
    match value.as_amount() {
        Some(amount) if amount.is_finite() => Rendered::Text(format_usd(amount)),
        _ => format_plain(value),
    }
}

fn format_date(value: &Value, dates: &DateStyle) -> Rendered {
    if value.is_null() {
        return Rendered::Placeholder;
    }
    match value.as_date().and_then(|date| dates.format(date)) {
        Some(text) => Rendered::Text(text),
        None => format_plain(value),
    }
}

fn format_plain(value: &Value) -> Rendered {
    match value.display() {
        Some(text) if !text.is_empty() => Rendered::Text(text),
        _ => Rendered::Placeholder,
    }
}

pub fn format_usd(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = group_thousands(absolute / 100);
    let cents_component = absolute % 100;
    format!("{sign}${dollars}.{cents_component:02}")
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
