// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::{Rendered, Row, Value};

pub type CellRenderer = Arc<dyn Fn(&Value, &Row) -> Rendered + Send + Sync>;

/// Must be a total order; the sort stage relies on it.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    Status,
    Boolean,
    Currency,
    Date,
    #[default]
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

#[derive(Clone)]
pub struct Column {
    pub field: String,
    pub header_name: String,
    pub kind: ColumnType,
    pub sortable: bool,
    pub align: Align,
    pub render: Option<CellRenderer>,
    pub comparator: Option<Comparator>,
}

impl Column {
    pub fn new(field: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header_name: header_name.into(),
            kind: ColumnType::Plain,
            sortable: true,
            align: Align::Left,
            render: None,
            comparator: None,
        }
    }

    pub fn kind(mut self, kind: ColumnType) -> Self {
        self.kind = kind;
        if kind == ColumnType::Currency && self.align == Align::Left {
            self.align = Align::Right;
        }
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn render(mut self, render: CellRenderer) -> Self {
        self.render = Some(render);
        self
    }

    pub fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = Some(comparator);
        self
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("header_name", &self.header_name)
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .field("align", &self.align)
            .field("render", &self.render.is_some())
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}
