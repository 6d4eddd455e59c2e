// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::{BulkSelection, IndexedRow, Row, Tone};

pub type RowActionHandler = Arc<dyn Fn(&IndexedRow) -> Result<()> + Send + Sync>;
pub type BulkActionHandler = Arc<dyn Fn(&BulkSelection) -> Result<()> + Send + Sync>;

/// Entry in a row's contextual menu.
#[derive(Clone)]
pub struct RowAction {
    pub label: String,
    pub icon: Option<String>,
    pub color: Option<Tone>,
    pub handler: RowActionHandler,
}

impl RowAction {
    pub fn new(label: impl Into<String>, handler: RowActionHandler) -> Self {
        Self {
            label: label.into(),
            icon: None,
            color: None,
            handler,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn color(mut self, color: Tone) -> Self {
        self.color = Some(color);
        self
    }
}

impl fmt::Debug for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// Toolbar action over the selected rows.
#[derive(Clone)]
pub struct BulkAction {
    pub label: String,
    pub icon: Option<String>,
    pub variant: Option<Tone>,
    pub requires_selection: bool,
    pub handler: BulkActionHandler,
}

impl BulkAction {
    pub fn new(label: impl Into<String>, handler: BulkActionHandler) -> Self {
        Self {
            label: label.into(),
            icon: None,
            variant: None,
            requires_selection: false,
            handler,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: Tone) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn requires_selection(mut self, requires_selection: bool) -> Self {
        self.requires_selection = requires_selection;
        self
    }

    pub fn is_enabled(&self, selected: usize) -> bool {
        !(self.requires_selection && selected == 0)
    }
}

impl fmt::Debug for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("variant", &self.variant)
            .field("requires_selection", &self.requires_selection)
            .finish_non_exhaustive()
    }
}

/// Screen position the menu was opened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuAnchor {
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionMenu {
    #[default]
    Closed,
    Open {
        anchor: MenuAnchor,
        row: IndexedRow,
    },
}

impl ActionMenu {
    pub fn open(&mut self, anchor: MenuAnchor, row: &Row, index: usize) {
        *self = Self::Open {
            anchor,
            row: IndexedRow {
                row: row.clone(),
                index,
            },
        };
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn row(&self) -> Option<&IndexedRow> {
        match self {
            Self::Open { row, .. } => Some(row),
            Self::Closed => None,
        }
    }

    pub fn anchor(&self) -> Option<MenuAnchor> {
        match self {
            Self::Open { anchor, .. } => Some(*anchor),
            Self::Closed => None,
        }
    }

    /// Runs `action` against the captured row. The menu is closed before the
    /// handler runs, so it stays closed on error or panic. Returns false when
    /// the menu was not open.
    pub fn select(&mut self, action: &RowAction) -> Result<bool> {
        let Self::Open { row, .. } = std::mem::take(self) else {
            return Ok(false);
        };
        (action.handler)(&row)?;
        Ok(true)
    }
}
