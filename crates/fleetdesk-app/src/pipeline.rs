// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Pure view derivation: `data -> filter -> sort -> paginate -> virtualize`.
//!
//! Every function here reads its inputs and returns a fresh sequence. Nothing
//! is cached between calls; the table state container calls
//! [`derive_visible_rows`] after each change.

use std::cmp::Ordering;
use std::collections::HashMap;
use time::Date;

use crate::{
    Column, ColumnType, RowKey, Row, SortConfig, SortDirection, TableOptions, TableUiState, Value,
    ViewportState,
};

pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;

/// A row borrowed from the caller's data along with its index in that data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRow<'a> {
    pub index: usize,
    pub row: &'a Row,
}

/// A row that survived every stage, with its position on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow<'a> {
    pub position: usize,
    pub key: RowKey,
    pub row: &'a Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualWindow {
    pub start: usize,
    pub end: usize,
    pub rows_in_view: usize,
}

impl VirtualWindow {
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'a> {
    /// Rows of the current page in display order (all sorted rows when
    /// pagination is off). Selection positions index into this.
    pub page_rows: Vec<VisibleRow<'a>>,
    /// The rows to draw: `page_rows`, or the virtual window slice of it.
    pub visible: Vec<VisibleRow<'a>>,
    pub filtered_count: usize,
    pub page: usize,
    pub page_count: usize,
    pub rows_per_page: usize,
    pub window: Option<VirtualWindow>,
    /// Placeholder rows to draw while loading; zero otherwise.
    pub placeholders: usize,
}

impl TableView<'_> {
    pub fn page_len(&self) -> usize {
        self.page_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders == 0 && self.page_rows.is_empty()
    }

    /// One-based `first..=last` range shown in the pagination footer.
    pub fn page_span(&self) -> Option<(usize, usize)> {
        if self.page_rows.is_empty() {
            return None;
        }
        let first = self.page.saturating_mul(self.rows_per_page) + 1;
        Some((first, first + self.page_rows.len() - 1))
    }
}

/// Key for one row: its id text when `id_field` is set and present, else its
/// source index.
pub fn row_key(row: &Row, source_index: usize, id_field: Option<&str>) -> RowKey {
    id_field
        .and_then(|field| row.get(field).display())
        .map(RowKey::Id)
        .unwrap_or(RowKey::Source(source_index))
}

/// Keys for one page. Ids shared by more than one row on the page (including
/// `1` and `"1"`, which display alike) fall back to source indexes so a
/// toggle marks exactly one row.
pub fn page_keys(rows: &[SourceRow<'_>], id_field: Option<&str>) -> Vec<RowKey> {
    let keys = rows
        .iter()
        .map(|source| row_key(source.row, source.index, id_field))
        .collect::<Vec<_>>();
    let mut counts = HashMap::<&RowKey, usize>::new();
    for key in &keys {
        *counts.entry(key).or_default() += 1;
    }
    keys.iter()
        .zip(rows)
        .map(|(key, source)| match counts.get(key) {
            Some(1) => key.clone(),
            _ => RowKey::Source(source.index),
        })
        .collect()
}

pub fn filter_rows<'a>(
    data: &'a [Row],
    columns: &[Column],
    search_term: &str,
) -> Vec<SourceRow<'a>> {
    let all = data
        .iter()
        .enumerate()
        .map(|(index, row)| SourceRow { index, row });
    if search_term.is_empty() {
        return all.collect();
    }

    let needle = search_term.to_lowercase();
    all.filter(|source| row_matches_search(source.row, columns, &needle))
        .collect()
}

fn row_matches_search(row: &Row, columns: &[Column], needle: &str) -> bool {
    columns.iter().any(|column| {
        row.get(&column.field)
            .display()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

pub fn sort_rows<'a>(
    rows: &[SourceRow<'a>],
    columns: &[Column],
    sort: &SortConfig,
) -> Vec<SourceRow<'a>> {
    let Some(key) = sort.key.as_deref() else {
        return rows.to_vec();
    };
    let column = columns.iter().find(|column| column.field == key);

    let directed = |order: Ordering| match sort.direction {
        SortDirection::Asc => order,
        SortDirection::Desc => order.reverse(),
    };

    if let Some(comparator) = column.and_then(|column| column.comparator.as_ref()) {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|left, right| directed(comparator(left.row.get(key), right.row.get(key))));
        return sorted;
    }

    let kind = column.map(|column| column.kind).unwrap_or_default();
    let mut keyed = rows
        .iter()
        .map(|source| (SortKey::for_value(source.row.get(key), kind), *source))
        .collect::<Vec<_>>();
    keyed.sort_by(|(left, _), (right, _)| directed(left.cmp_key(right)));
    keyed.into_iter().map(|(_, source)| source).collect()
}

pub fn paginate_rows<T>(rows: &[T], page: usize, rows_per_page: usize) -> &[T] {
    let start = page.saturating_mul(rows_per_page);
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(rows_per_page).min(rows.len());
    &rows[start..end]
}

pub fn virtual_window(
    total: usize,
    viewport: &ViewportState,
    row_height: u32,
    overscan: usize,
) -> VirtualWindow {
    let row_height = row_height.max(1);
    let height = viewport
        .viewport_height
        .unwrap_or(DEFAULT_VIEWPORT_HEIGHT);
    let rows_in_view = (height.div_ceil(row_height) as usize)
        .saturating_add(overscan)
        .max(1);
    let start = ((viewport.scroll_top / row_height) as usize).min(total);
    let end = start.saturating_add(rows_in_view).min(total);
    VirtualWindow {
        start,
        end,
        rows_in_view,
    }
}

pub fn page_count(total: usize, rows_per_page: usize) -> usize {
    if rows_per_page == 0 {
        return 0;
    }
    total.div_ceil(rows_per_page)
}

pub fn derive_visible_rows<'a>(
    data: &'a [Row],
    columns: &[Column],
    options: &TableOptions,
    ui: &TableUiState,
) -> TableView<'a> {
    let rows_per_page = ui.rows_per_page;
    if options.loading {
        return TableView {
            page_rows: Vec::new(),
            visible: Vec::new(),
            filtered_count: 0,
            page: ui.page,
            page_count: 0,
            rows_per_page,
            window: None,
            placeholders: rows_per_page,
        };
    }

    let search_term = if options.searchable {
        ui.search_term.as_str()
    } else {
        ""
    };
    let filtered = filter_rows(data, columns, search_term);
    let sorted = sort_rows(&filtered, columns, &ui.sort);

    let (page_slice, page_count) = if options.pagination {
        (
            paginate_rows(&sorted, ui.page, rows_per_page),
            page_count(sorted.len(), rows_per_page),
        )
    } else {
        (sorted.as_slice(), 1)
    };

    let keys = page_keys(page_slice, options.id_field.as_deref());
    let page_rows = page_slice
        .iter()
        .zip(keys)
        .enumerate()
        .map(|(position, (source, key))| VisibleRow {
            position,
            key,
            row: source.row,
        })
        .collect::<Vec<_>>();

    let window = (!options.pagination && options.virtualize).then(|| {
        virtual_window(
            page_rows.len(),
            &ui.viewport,
            options.virtual_row_height,
            options.overscan,
        )
    });
    let visible = match window {
        Some(window) => page_rows[window.start..window.end].to_vec(),
        None => page_rows.clone(),
    };

    TableView {
        page_rows,
        visible,
        filtered_count: sorted.len(),
        page: if options.pagination { ui.page } else { 0 },
        page_count,
        rows_per_page,
        window,
        placeholders: 0,
    }
}

/// Precomputed ordering key for one cell.
///
/// Two text keys compare lexicographically even when both look numeric. A
/// number against numeric text compares numerically. Any other cross-kind
/// pair orders by rank: numbers, then dates, then text, then nulls. Null
/// being greatest keeps descending an exact reverse of ascending.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Date(Date),
    Text(String),
    Null,
}

impl SortKey {
    fn for_value(value: &Value, kind: ColumnType) -> Self {
        if value.is_null() {
            return Self::Null;
        }
        match kind {
            ColumnType::Currency => value
                .as_amount()
                .map(Self::Number)
                .unwrap_or_else(|| Self::natural(value)),
            ColumnType::Date => value
                .as_date()
                .map(Self::Date)
                .unwrap_or_else(|| Self::natural(value)),
            ColumnType::Status => value
                .display()
                .map(|label| Self::Text(label.to_lowercase()))
                .unwrap_or(Self::Null),
            ColumnType::Boolean => Self::Number(if value.is_truthy() { 1.0 } else { 0.0 }),
            ColumnType::Plain => Self::natural(value),
        }
    }

    // Text stays text; it is read as a number only against a number key.
    fn natural(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Date(date) => Self::Date(*date),
            Value::Text(text) => Self::Text(text.clone()),
            other => other.as_number().map(Self::Number).unwrap_or(Self::Null),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
            Self::Null => 3,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(left), Self::Text(right)) => match numeric_text(right) {
                Some(right) => left.total_cmp(&right),
                None => self.rank().cmp(&other.rank()),
            },
            (Self::Text(left), Self::Number(right)) => match numeric_text(left) {
                Some(left) => left.total_cmp(right),
                None => self.rank().cmp(&other.rank()),
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
