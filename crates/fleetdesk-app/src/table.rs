// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fmt;
use tracing::{debug, info};

use crate::{
    ActionMenu, BulkAction, BulkSelection, CheckState, Column, DateStyle, MenuAnchor, Row,
    RowAction, RowKey, Selection, SortConfig, SortDirection, TableView, ViewportEvent, ViewportHub,
    ViewportState, ViewportSubscription, derive_visible_rows,
};

pub const DEFAULT_ROWS_PER_PAGE: usize = 10;
pub const DEFAULT_ROWS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_ROW_HEIGHT: u32 = 48;
pub const DEFAULT_OVERSCAN: usize = 5;
pub const DEFAULT_EMPTY_MESSAGE: &str = "No data available";
pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search...";

/// Construction-time configuration of a table.
#[derive(Clone)]
pub struct TableOptions {
    pub selectable: bool,
    pub sortable: bool,
    pub searchable: bool,
    pub pagination: bool,
    pub loading: bool,
    pub virtualize: bool,
    pub actions: Vec<BulkAction>,
    pub row_actions: Vec<RowAction>,
    pub empty_message: String,
    pub search_placeholder: String,
    pub virtual_row_height: u32,
    pub overscan: usize,
    pub rows_per_page_options: Vec<usize>,
    pub rows_per_page: usize,
    /// Field whose display text identifies a row. Should be unique; rows
    /// sharing an id on one page are keyed by source index instead.
    pub id_field: Option<String>,
    pub date_style: DateStyle,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            selectable: false,
            sortable: true,
            searchable: true,
            pagination: true,
            loading: false,
            virtualize: false,
            actions: Vec::new(),
            row_actions: Vec::new(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_owned(),
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_owned(),
            virtual_row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            rows_per_page_options: DEFAULT_ROWS_PER_PAGE_OPTIONS.to_vec(),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            id_field: None,
            date_style: DateStyle::default(),
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("selectable", &self.selectable)
            .field("sortable", &self.sortable)
            .field("searchable", &self.searchable)
            .field("pagination", &self.pagination)
            .field("loading", &self.loading)
            .field("virtualize", &self.virtualize)
            .field("actions", &self.actions)
            .field("row_actions", &self.row_actions)
            .field("virtual_row_height", &self.virtual_row_height)
            .field("overscan", &self.overscan)
            .field("rows_per_page", &self.rows_per_page)
            .field("id_field", &self.id_field)
            .finish_non_exhaustive()
    }
}

/// Everything the user can change while a table is mounted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableUiState {
    pub search_term: String,
    pub sort: SortConfig,
    pub page: usize,
    pub rows_per_page: usize,
    pub selection: Selection,
    pub viewport: ViewportState,
    pub menu: ActionMenu,
}

impl TableUiState {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCommand {
    SetSearch(String),
    Sort(String),
    SetPage(usize),
    NextPage,
    PrevPage,
    SetRowsPerPage(usize),
    ToggleAll(bool),
    ToggleOne(usize),
    OpenMenu { position: usize, anchor: MenuAnchor },
    CloseMenu,
    SelectRowAction(usize),
    RunBulkAction(usize),
    SetPagination(bool),
    SetVirtualize(bool),
    ScrollTo(u32),
    ResizeViewport(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    SearchChanged(String),
    SortChanged(SortConfig),
    SortUnavailable(String),
    PageChanged(usize),
    RowsPerPageChanged(usize),
    RowsPerPageRejected(usize),
    SelectionChanged(usize),
    SelectionPruned(usize),
    SelectionUnavailable,
    MenuOpened(usize),
    MenuClosed,
    MenuUnavailable,
    RowActionInvoked(String),
    BulkActionInvoked(String),
    BulkActionDisabled(String),
    ActionMissing(usize),
    PaginationChanged(bool),
    VirtualizeChanged(bool),
    ViewportChanged(ViewportState),
}

impl TableEvent {
    /// Short status-line text, for events worth telling the user about.
    pub fn message(&self) -> Option<String> {
        let message = match self {
            Self::SearchChanged(_) | Self::ViewportChanged(_) | Self::MenuOpened(_) => {
                return None;
            }
            Self::SortChanged(sort) => match &sort.key {
                Some(key) => format!("sort {key} {}", sort.direction.as_str()),
                None => "sort cleared".to_owned(),
            },
            Self::SortUnavailable(field) => format!("sort unavailable: {field}"),
            Self::PageChanged(page) => format!("page {}", page + 1),
            Self::RowsPerPageChanged(size) => format!("{size} rows per page"),
            Self::RowsPerPageRejected(size) => format!("{size} rows per page not offered"),
            Self::SelectionChanged(count) => format!("{count} selected"),
            Self::SelectionPruned(count) => format!("{count} off-page selections cleared"),
            Self::SelectionUnavailable => "selection unavailable".to_owned(),
            Self::MenuClosed => "menu closed".to_owned(),
            Self::MenuUnavailable => "no row actions".to_owned(),
            Self::RowActionInvoked(label) => format!("{label} requested"),
            Self::BulkActionInvoked(label) => format!("{label} requested"),
            Self::BulkActionDisabled(label) => format!("{label} needs a selection"),
            Self::ActionMissing(index) => format!("no action {}", index + 1),
            Self::PaginationChanged(true) => "pagination on".to_owned(),
            Self::PaginationChanged(false) => "pagination off".to_owned(),
            Self::VirtualizeChanged(true) => "virtual scroll on".to_owned(),
            Self::VirtualizeChanged(false) => "virtual scroll off".to_owned(),
        };
        Some(message)
    }
}

/// State container for one table: owns the records, the column schema, and
/// the UI state, and re-derives the view from them on demand.
pub struct Table {
    data: Vec<Row>,
    columns: Vec<Column>,
    options: TableOptions,
    ui: TableUiState,
    viewport_hub: Option<ViewportHub>,
    viewport_subscription: Option<ViewportSubscription>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("rows", &self.data.len())
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("ui", &self.ui)
            .field("subscribed", &self.viewport_subscription.is_some())
            .finish()
    }
}

impl Table {
    pub fn new(columns: Vec<Column>, options: TableOptions) -> Self {
        let ui = TableUiState::new(options.rows_per_page);
        Self {
            data: Vec::new(),
            columns,
            options,
            ui,
            viewport_hub: None,
            viewport_subscription: None,
        }
    }

    pub fn with_data(mut self, data: Vec<Row>) -> Self {
        self.set_data(data);
        self
    }

    pub fn data(&self) -> &[Row] {
        &self.data
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn ui(&self) -> &TableUiState {
        &self.ui
    }

    /// Replaces the records and drops selections that no longer show.
    pub fn set_data(&mut self, data: Vec<Row>) {
        debug!(rows = data.len(), "table data replaced");
        self.data = data;
        self.reconcile_selection();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.options.loading = loading;
    }

    pub fn view(&self) -> TableView<'_> {
        derive_visible_rows(&self.data, &self.columns, &self.options, &self.ui)
    }

    pub fn virtualization_active(&self) -> bool {
        !self.options.pagination && self.options.virtualize
    }

    pub fn is_subscribed(&self) -> bool {
        self.viewport_subscription.is_some()
    }

    /// Connects the table to a viewport hub. Listeners are attached only
    /// while virtualization is active.
    pub fn attach_viewport(&mut self, hub: ViewportHub) -> Result<()> {
        self.viewport_subscription = None;
        self.viewport_hub = Some(hub);
        self.refresh_subscription()
    }

    /// Drops listeners and forgets the hub.
    pub fn detach_viewport(&mut self) {
        self.viewport_subscription = None;
        self.viewport_hub = None;
    }

    /// Applies queued scroll/resize notifications; true when the viewport moved.
    pub fn sync_viewport(&mut self) -> bool {
        match &self.viewport_subscription {
            Some(subscription) => subscription.apply_pending(&mut self.ui.viewport),
            None => false,
        }
    }

    pub fn page_keys(&self) -> Vec<RowKey> {
        self.view()
            .page_rows
            .into_iter()
            .map(|row| row.key)
            .collect()
    }

    pub fn selected_positions(&self) -> Vec<usize> {
        self.ui.selection.positions(&self.page_keys())
    }

    pub fn header_check_state(&self) -> CheckState {
        self.ui.selection.check_state(&self.page_keys())
    }

    pub fn bulk_selection(&self) -> BulkSelection {
        let view = self.view();
        let mut selection = BulkSelection::default();
        for row in view.page_rows {
            if self.ui.selection.contains(&row.key) {
                selection.positions.push(row.position);
                selection.rows.push(row.row.clone());
                selection.keys.push(row.key);
            }
        }
        selection
    }

    /// Page size `delta` steps away in the offered list, clamped to its ends.
    pub fn step_rows_per_page(&self, delta: isize) -> Option<usize> {
        let sizes = &self.options.rows_per_page_options;
        let current = sizes
            .iter()
            .position(|size| *size == self.ui.rows_per_page)
            .unwrap_or(0);
        let next = if delta.is_negative() {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as usize)
        };
        sizes.get(next.min(sizes.len().saturating_sub(1))).copied()
    }

    pub fn dispatch(&mut self, command: TableCommand) -> Result<Vec<TableEvent>> {
        let mut events = match command {
            TableCommand::SetSearch(term) => self.set_search(term),
            TableCommand::Sort(field) => self.handle_sort(&field),
            TableCommand::SetPage(page) => self.set_page(page),
            TableCommand::NextPage => {
                let last = self.view().page_count.saturating_sub(1);
                self.set_page(self.ui.page.saturating_add(1).min(last))
            }
            TableCommand::PrevPage => self.set_page(self.ui.page.saturating_sub(1)),
            TableCommand::SetRowsPerPage(size) => self.set_rows_per_page(size),
            TableCommand::ToggleAll(checked) => self.toggle_all(checked),
            TableCommand::ToggleOne(position) => self.toggle_one(position),
            TableCommand::OpenMenu { position, anchor } => self.open_menu(position, anchor),
            TableCommand::CloseMenu => {
                self.ui.menu.close();
                vec![TableEvent::MenuClosed]
            }
            TableCommand::SelectRowAction(index) => self.select_row_action(index)?,
            TableCommand::RunBulkAction(index) => self.run_bulk_action(index)?,
            TableCommand::SetPagination(enabled) => {
                self.options.pagination = enabled;
                self.refresh_subscription()?;
                vec![TableEvent::PaginationChanged(enabled)]
            }
            TableCommand::SetVirtualize(enabled) => {
                self.options.virtualize = enabled;
                self.refresh_subscription()?;
                vec![TableEvent::VirtualizeChanged(enabled)]
            }
            TableCommand::ScrollTo(top) => self.apply_viewport(ViewportEvent::Scrolled { top }),
            TableCommand::ResizeViewport(height) => {
                self.apply_viewport(ViewportEvent::Resized { height })
            }
        };

        if let Some(pruned) = self.reconcile_selection() {
            events.push(TableEvent::SelectionPruned(pruned));
        }
        Ok(events)
    }

    /// Same column flips direction; a different column starts ascending.
    pub fn handle_sort(&mut self, field: &str) -> Vec<TableEvent> {
        let column_sortable = self
            .columns
            .iter()
            .find(|column| column.field == field)
            .is_some_and(|column| column.sortable);
        if !self.options.sortable || !column_sortable {
            return vec![TableEvent::SortUnavailable(field.to_owned())];
        }

        let direction = if self.ui.sort.key.as_deref() == Some(field) {
            self.ui.sort.direction.toggled()
        } else {
            SortDirection::Asc
        };
        self.ui.sort = SortConfig::by(field, direction);
        debug!(field, direction = direction.as_str(), "sort changed");
        vec![TableEvent::SortChanged(self.ui.sort.clone())]
    }

    fn set_search(&mut self, term: String) -> Vec<TableEvent> {
        if term == self.ui.search_term {
            return Vec::new();
        }
        self.ui.search_term = term.clone();
        let mut events = vec![TableEvent::SearchChanged(term)];
        if self.ui.page != 0 {
            self.ui.page = 0;
            events.push(TableEvent::PageChanged(0));
        }
        events
    }

    fn set_page(&mut self, page: usize) -> Vec<TableEvent> {
        if page == self.ui.page {
            return Vec::new();
        }
        self.ui.page = page;
        vec![TableEvent::PageChanged(page)]
    }

    fn set_rows_per_page(&mut self, size: usize) -> Vec<TableEvent> {
        if !self.options.rows_per_page_options.contains(&size) {
            return vec![TableEvent::RowsPerPageRejected(size)];
        }
        self.ui.rows_per_page = size;
        self.ui.page = 0;
        debug!(size, "rows per page changed, page reset");
        vec![TableEvent::RowsPerPageChanged(size)]
    }

    fn toggle_all(&mut self, checked: bool) -> Vec<TableEvent> {
        if !self.options.selectable {
            return vec![TableEvent::SelectionUnavailable];
        }
        let page = self.page_keys();
        self.ui.selection.toggle_all(checked, &page);
        vec![TableEvent::SelectionChanged(self.ui.selection.len())]
    }

    fn toggle_one(&mut self, position: usize) -> Vec<TableEvent> {
        if !self.options.selectable {
            return vec![TableEvent::SelectionUnavailable];
        }
        let page = self.page_keys();
        if !self.ui.selection.toggle_one(position, &page) {
            return Vec::new();
        }
        vec![TableEvent::SelectionChanged(self.ui.selection.len())]
    }

    fn open_menu(&mut self, position: usize, anchor: MenuAnchor) -> Vec<TableEvent> {
        if self.options.row_actions.is_empty() {
            return vec![TableEvent::MenuUnavailable];
        }
        let view = self.view();
        let Some(target) = view.page_rows.get(position) else {
            return Vec::new();
        };
        let row = target.row.clone();
        self.ui.menu.open(anchor, &row, position);
        vec![TableEvent::MenuOpened(position)]
    }

    fn select_row_action(&mut self, index: usize) -> Result<Vec<TableEvent>> {
        let Some(action) = self.options.row_actions.get(index).cloned() else {
            return Ok(vec![TableEvent::ActionMissing(index)]);
        };
        let row_index = self.ui.menu.row().map(|row| row.index);
        let invoked = self
            .ui
            .menu
            .select(&action)
            .with_context(|| format!("row action {:?}", action.label))?;
        if !invoked {
            return Ok(Vec::new());
        }
        info!(action = %action.label, row = ?row_index, "row action invoked");
        Ok(vec![
            TableEvent::RowActionInvoked(action.label),
            TableEvent::MenuClosed,
        ])
    }

    fn run_bulk_action(&mut self, index: usize) -> Result<Vec<TableEvent>> {
        let Some(action) = self.options.actions.get(index).cloned() else {
            return Ok(vec![TableEvent::ActionMissing(index)]);
        };
        let selection = self.bulk_selection();
        if !action.is_enabled(selection.len()) {
            return Ok(vec![TableEvent::BulkActionDisabled(action.label)]);
        }
        (action.handler)(&selection)
            .with_context(|| format!("bulk action {:?}", action.label))?;
        info!(action = %action.label, rows = selection.len(), "bulk action invoked");
        Ok(vec![TableEvent::BulkActionInvoked(action.label)])
    }

    fn apply_viewport(&mut self, event: ViewportEvent) -> Vec<TableEvent> {
        if self.ui.viewport.apply(event) {
            vec![TableEvent::ViewportChanged(self.ui.viewport)]
        } else {
            Vec::new()
        }
    }

    fn refresh_subscription(&mut self) -> Result<()> {
        if !self.virtualization_active() {
            self.viewport_subscription = None;
            return Ok(());
        }
        if self.viewport_subscription.is_some() {
            return Ok(());
        }
        if let Some(hub) = &self.viewport_hub {
            self.viewport_subscription = Some(hub.subscribe().context("subscribe to viewport")?);
        }
        Ok(())
    }

    fn reconcile_selection(&mut self) -> Option<usize> {
        if self.ui.selection.is_empty() {
            return None;
        }
        let page = self.page_keys();
        let pruned = self.ui.selection.retain_page(&page);
        (pruned > 0).then_some(pruned)
    }
}
