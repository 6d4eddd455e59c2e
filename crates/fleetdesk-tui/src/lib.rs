// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod screens;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fleetdesk_app::{
    ActionMenu, Align, AppCommand, AppMode, AppState, CheckState, IndexedRow, MenuAnchor,
    RequestId, Rendered, Row, ScreenKind, SortConfig, SortDirection, Table, TableCommand,
    TableEvent, TableView, Tone, ViewportEvent, ViewportHub, format_cell,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table as TableWidget, Tabs,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use screens::{ActionSink, FleetAction, TableSettings};

const WHEEL_ROWS: u32 = 3;
const CHECKBOX_WIDTH: u16 = 3;
// Terminal rows outside the table body.
const CHROME_ROWS: u16 = 3 + 1 + 3 + 1 + 2;

/// Record store boundary. Loads rows per screen and applies the mutations
/// that row and bulk actions request.
pub trait TableRuntime {
    fn load_rows(&mut self, screen: ScreenKind) -> Result<Vec<Row>>;
    fn apply_row_action(
        &mut self,
        screen: ScreenKind,
        action: FleetAction,
        row: &IndexedRow,
    ) -> Result<String>;
    fn apply_bulk_action(
        &mut self,
        screen: ScreenKind,
        action: FleetAction,
        rows: &[Row],
    ) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    RowAction {
        id: RequestId,
        screen: ScreenKind,
        action: FleetAction,
        row: IndexedRow,
    },
    BulkAction {
        id: RequestId,
        screen: ScreenKind,
        action: FleetAction,
        rows: Vec<Row>,
    },
}

#[derive(Debug)]
struct ScreenTable {
    screen: ScreenKind,
    table: Table,
    hub: ViewportHub,
    selected_row: usize,
    selected_col: usize,
}

#[derive(Debug)]
struct ViewData {
    screens: Vec<ScreenTable>,
    menu_cursor: usize,
    body_rows: u16,
    status_token: u64,
    pending_reloads: Vec<PendingReload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingReload {
    screen: ScreenKind,
    announce: bool,
}

impl ViewData {
    fn new(settings: &TableSettings, sink: &ActionSink) -> Result<Self> {
        let mut entries = Vec::with_capacity(ScreenKind::ALL.len());
        for screen in ScreenKind::ALL {
            let hub = ViewportHub::new();
            let mut table = screens::screen_table(screen, settings, sink);
            table
                .attach_viewport(hub.clone())
                .with_context(|| format!("attach {} table to viewport", screen.as_str()))?;
            entries.push(ScreenTable {
                screen,
                table,
                hub,
                selected_row: 0,
                selected_col: 0,
            });
        }
        Ok(Self {
            screens: entries,
            menu_cursor: 0,
            body_rows: 0,
            status_token: 0,
            pending_reloads: Vec::new(),
        })
    }

    fn active(&self, state: &AppState) -> Option<&ScreenTable> {
        self.screens
            .iter()
            .find(|entry| entry.screen == state.active_screen)
    }

    fn active_mut(&mut self, state: &AppState) -> Option<&mut ScreenTable> {
        self.screens
            .iter_mut()
            .find(|entry| entry.screen == state.active_screen)
    }

    fn screen_mut(&mut self, screen: ScreenKind) -> Option<&mut ScreenTable> {
        self.screens.iter_mut().find(|entry| entry.screen == screen)
    }
}

// Terminal modes live exactly as long as this guard.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let guard = Self;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture
        )
        .context("enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = disable_raw_mode();
    }
}

pub fn run_app<R: TableRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    settings: &TableSettings,
) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    let sink = ActionSink::new(internal_tx.clone());
    let mut view_data = ViewData::new(settings, &sink)?;
    for screen in ScreenKind::ALL {
        request_reload(&mut view_data, screen, false);
    }

    let _guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let size = terminal.size().context("read terminal size")?;
    handle_resize(&mut view_data, size.height);

    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);
        sync_viewports(&mut view_data);

        terminal
            .draw(|frame| render(frame, state, &view_data))
            .context("draw frame")?;

        // Loading screens have been drawn; fetch their rows and redraw.
        if run_pending_reloads(state, runtime, &mut view_data, &internal_tx) {
            continue;
        }

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) => {
                if handle_key_event(state, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(state, &mut view_data, mouse),
            Event::Resize(_, height) => handle_resize(&mut view_data, height),
            _ => {}
        }
    }

    for entry in &view_data.screens {
        entry.hub.close();
    }
    info!("event loop finished");
    Ok(())
}

/// Marks a screen as loading. Its rows are fetched after the next frame so
/// the placeholders get drawn.
fn request_reload(view_data: &mut ViewData, screen: ScreenKind, announce: bool) {
    let Some(entry) = view_data.screen_mut(screen) else {
        return;
    };
    entry.table.set_loading(true);
    if let Some(pending) = view_data
        .pending_reloads
        .iter_mut()
        .find(|pending| pending.screen == screen)
    {
        pending.announce |= announce;
    } else {
        view_data.pending_reloads.push(PendingReload { screen, announce });
    }
}

fn run_pending_reloads<R: TableRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    let pending = std::mem::take(&mut view_data.pending_reloads);
    for PendingReload { screen, announce } in &pending {
        match reload_screen(runtime, view_data, *screen) {
            Ok(()) if *announce => {
                emit_status(state, view_data, internal_tx, format!("{} reloaded", screen.as_str()));
            }
            Ok(()) => {}
            Err(error) => {
                warn!(screen = screen.as_str(), error = %format!("{error:#}"), "load failed");
                emit_status(state, view_data, internal_tx, format!("{error:#}"));
            }
        }
    }
    !pending.is_empty()
}

fn reload_screen<R: TableRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    screen: ScreenKind,
) -> Result<()> {
    let Some(entry) = view_data.screen_mut(screen) else {
        return Ok(());
    };
    let loaded = runtime
        .load_rows(screen)
        .with_context(|| format!("load {}", screen.as_str()));
    entry.table.set_loading(false);
    let rows = loaded?;
    debug!(screen = screen.as_str(), rows = rows.len(), "screen loaded");
    entry.table.set_data(rows);
    settle_viewport(entry);
    clamp_cursor(entry);
    Ok(())
}

fn process_internal_events<R: TableRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::RowAction {
                id,
                screen,
                action,
                row,
            } => {
                info!(
                    request = id.get(),
                    screen = screen.as_str(),
                    action = action.label(),
                    "row action request"
                );
                let outcome = runtime.apply_row_action(screen, action, &row);
                finish_action(state, view_data, tx, screen, action, outcome);
            }
            InternalEvent::BulkAction {
                id,
                screen,
                action,
                rows,
            } => {
                info!(
                    request = id.get(),
                    screen = screen.as_str(),
                    action = action.label(),
                    rows = rows.len(),
                    "bulk action request"
                );
                let outcome = runtime.apply_bulk_action(screen, action, &rows);
                finish_action(state, view_data, tx, screen, action, outcome);
            }
        }
    }
}

fn finish_action(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    screen: ScreenKind,
    action: FleetAction,
    outcome: Result<String>,
) {
    match outcome {
        Ok(message) => {
            if action.target_status().is_some() {
                request_reload(view_data, screen, false);
            }
            emit_status(state, view_data, tx, message);
        }
        Err(error) => {
            warn!(
                screen = screen.as_str(),
                action = action.label(),
                error = %format!("{error:#}"),
                "action failed"
            );
            emit_status(
                state,
                view_data,
                tx,
                format!("{} failed: {error:#}", action.label()),
            );
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match state.mode {
        AppMode::Search => {
            handle_search_key(state, view_data, internal_tx, key);
            false
        }
        AppMode::Menu => {
            handle_menu_key(state, view_data, internal_tx, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, view_data, internal_tx, key),
    }
}

fn handle_search_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            let Some(entry) = view_data.active(state) else {
                return;
            };
            let mut term = entry.table.ui().search_term.clone();
            term.pop();
            apply_command(state, view_data, internal_tx, TableCommand::SetSearch(term));
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let Some(entry) = view_data.active(state) else {
                return;
            };
            let mut term = entry.table.ui().search_term.clone();
            term.push(ch);
            apply_command(state, view_data, internal_tx, TableCommand::SetSearch(term));
        }
        _ => {}
    }
}

fn handle_menu_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let action_count = view_data
        .active(state)
        .map(|entry| entry.table.options().row_actions.len())
        .unwrap_or(0);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.menu_cursor = (view_data.menu_cursor + 1).min(action_count.saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.menu_cursor = view_data.menu_cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            let index = view_data.menu_cursor;
            apply_command(state, view_data, internal_tx, TableCommand::SelectRowAction(index));
            leave_menu(state, view_data);
        }
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            apply_command(state, view_data, internal_tx, TableCommand::SelectRowAction(index));
            leave_menu(state, view_data);
        }
        KeyCode::Esc => {
            apply_command(state, view_data, internal_tx, TableCommand::CloseMenu);
            leave_menu(state, view_data);
        }
        _ => {}
    }
}

fn leave_menu(state: &mut AppState, view_data: &mut ViewData) {
    let still_open = view_data
        .active(state)
        .is_some_and(|entry| entry.table.ui().menu.is_open());
    if !still_open {
        view_data.menu_cursor = 0;
        state.dispatch(AppCommand::ExitToNav);
    }
}

fn handle_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return true,
        (KeyCode::Tab, _) => {
            state.dispatch(AppCommand::NextScreen);
        }
        (KeyCode::BackTab, _) => {
            state.dispatch(AppCommand::PrevScreen);
        }
        (KeyCode::Char('/'), _) => {
            if view_data
                .active(state)
                .is_some_and(|entry| entry.table.options().searchable)
            {
                state.dispatch(AppCommand::EnterSearch);
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            request_reload(view_data, state.active_screen, true);
        }
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            scroll_half_page(state, view_data, 1);
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            scroll_half_page(state, view_data, -1);
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => toggle_virtual(state, view_data, internal_tx),
        (KeyCode::Enter, _) => open_menu(state, view_data, internal_tx),
        _ => {
            let Some(entry) = view_data.active(state) else {
                return false;
            };
            if let Some(command) = table_command_for_key(entry, key) {
                apply_command(state, view_data, internal_tx, command);
            } else {
                move_cursor_for_key(state, view_data, key);
            }
        }
    }
    false
}

/// Maps a navigation key to an engine command for the active table.
fn table_command_for_key(entry: &ScreenTable, key: KeyEvent) -> Option<TableCommand> {
    let table = &entry.table;
    match key.code {
        KeyCode::Char('s') => table
            .columns()
            .get(entry.selected_col)
            .map(|column| TableCommand::Sort(column.field.clone())),
        KeyCode::Char('n') => Some(TableCommand::NextPage),
        KeyCode::Char('p') => Some(TableCommand::PrevPage),
        KeyCode::Char('+') | KeyCode::Char('=') => table
            .step_rows_per_page(1)
            .map(TableCommand::SetRowsPerPage),
        KeyCode::Char('-') => table
            .step_rows_per_page(-1)
            .map(TableCommand::SetRowsPerPage),
        KeyCode::Char(' ') => Some(TableCommand::ToggleOne(entry.selected_row)),
        KeyCode::Char('a') => Some(TableCommand::ToggleAll(
            table.header_check_state() != CheckState::Checked,
        )),
        KeyCode::Char(digit @ '1'..='9') => {
            Some(TableCommand::RunBulkAction(digit as usize - '1' as usize))
        }
        _ => None,
    }
}

fn move_cursor_for_key(state: &AppState, view_data: &mut ViewData, key: KeyEvent) {
    let (rows, cols) = match key.code {
        KeyCode::Char('j') | KeyCode::Down => (1, 0),
        KeyCode::Char('k') | KeyCode::Up => (-1, 0),
        KeyCode::Char('h') | KeyCode::Left => (0, -1),
        KeyCode::Char('l') | KeyCode::Right => (0, 1),
        _ => return,
    };
    move_cursor(state, view_data, rows, cols);
}

fn move_cursor(state: &AppState, view_data: &mut ViewData, rows: isize, cols: isize) {
    let body_rows = view_data.body_rows;
    let Some(entry) = view_data.active_mut(state) else {
        return;
    };
    entry.selected_row = entry.selected_row.saturating_add_signed(rows);
    entry.selected_col = entry.selected_col.saturating_add_signed(cols);
    clamp_cursor(entry);
    if entry.table.virtualization_active() {
        keep_cursor_in_view(entry, body_rows);
    }
}

fn clamp_cursor(entry: &mut ScreenTable) {
    let rows = entry.table.view().page_len();
    let cols = entry.table.columns().len();
    entry.selected_row = entry.selected_row.min(rows.saturating_sub(1));
    entry.selected_col = entry.selected_col.min(cols.saturating_sub(1));
}

// Scrolls the virtual viewport just enough to show the cursor row.
fn keep_cursor_in_view(entry: &mut ScreenTable, body_rows: u16) {
    let row_height = entry.table.options().virtual_row_height.max(1);
    let viewport = entry.table.ui().viewport;
    let first = (viewport.scroll_top / row_height) as usize;
    let shown = usize::from(body_rows.max(1));
    let target = if entry.selected_row < first {
        Some(entry.selected_row)
    } else if entry.selected_row >= first + shown {
        Some(entry.selected_row + 1 - shown)
    } else {
        None
    };
    if let Some(top_row) = target {
        scroll_to_row(entry, top_row);
    }
}

fn scroll_to_row(entry: &mut ScreenTable, top_row: usize) {
    let row_height = entry.table.options().virtual_row_height.max(1);
    let top_row = u32::try_from(top_row).unwrap_or(u32::MAX);
    let top = top_row.saturating_mul(row_height);
    publish(&entry.hub, ViewportEvent::Scrolled { top });
    entry.table.sync_viewport();
}

// Pulls the virtual viewport back onto the rows when the row set shrinks.
fn settle_viewport(entry: &mut ScreenTable) {
    if !entry.table.virtualization_active() {
        return;
    }
    let row_height = entry.table.options().virtual_row_height.max(1);
    let last_row = entry.table.view().page_len().saturating_sub(1);
    let first = (entry.table.ui().viewport.scroll_top / row_height) as usize;
    if first > last_row {
        scroll_to_row(entry, last_row);
    }
}

fn scroll_half_page(state: &AppState, view_data: &mut ViewData, direction: isize) {
    let half = isize::try_from(view_data.body_rows.max(2) / 2).unwrap_or(isize::MAX);
    scroll_rows(state, view_data, half.saturating_mul(direction));
}

// Moves the cursor, and in virtual mode the viewport with it.
fn scroll_rows(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let Some(entry) = view_data.active_mut(state) else {
        return;
    };
    if entry.table.virtualization_active() {
        let row_height = entry.table.options().virtual_row_height.max(1);
        let last_row = entry.table.view().page_len().saturating_sub(1);
        let current = (entry.table.ui().viewport.scroll_top / row_height) as usize;
        let top = current.saturating_add_signed(delta).min(last_row);
        scroll_to_row(entry, top);
        entry.selected_row = top;
        clamp_cursor(entry);
    } else {
        move_cursor(state, view_data, delta, 0);
    }
}

fn handle_mouse_event(state: &AppState, view_data: &mut ViewData, mouse: MouseEvent) {
    let delta = match mouse.kind {
        MouseEventKind::ScrollDown => WHEEL_ROWS as isize,
        MouseEventKind::ScrollUp => -(WHEEL_ROWS as isize),
        _ => return,
    };
    scroll_rows(state, view_data, delta);
}

fn handle_resize(view_data: &mut ViewData, terminal_height: u16) {
    view_data.body_rows = body_rows_for(terminal_height);
    for entry in &view_data.screens {
        if entry.table.is_subscribed() {
            publish_height(entry, view_data.body_rows);
        }
    }
    sync_viewports(view_data);
}

fn sync_viewports(view_data: &mut ViewData) {
    for entry in &mut view_data.screens {
        if entry.table.sync_viewport() {
            clamp_cursor(entry);
        }
    }
}

fn publish_height(entry: &ScreenTable, body_rows: u16) {
    let row_height = entry.table.options().virtual_row_height.max(1);
    let height = u32::from(body_rows).saturating_mul(row_height);
    publish(&entry.hub, ViewportEvent::Resized { height });
}

fn publish(hub: &ViewportHub, event: ViewportEvent) {
    if let Err(error) = hub.publish(event) {
        warn!(error = %error, "viewport event dropped");
    }
}

fn body_rows_for(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(CHROME_ROWS).max(1)
}

fn toggle_virtual(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(entry) = view_data.active(state) else {
        return;
    };
    let enable = !entry.table.virtualization_active();
    let commands = if enable {
        [TableCommand::SetPagination(false), TableCommand::SetVirtualize(true)]
    } else {
        [TableCommand::SetVirtualize(false), TableCommand::SetPagination(true)]
    };
    for command in commands {
        apply_command(state, view_data, internal_tx, command);
    }
    if enable {
        let Some(entry) = view_data.active(state) else {
            return;
        };
        publish_height(entry, view_data.body_rows);
        publish(&entry.hub, ViewportEvent::Scrolled { top: 0 });
        sync_viewports(view_data);
    }
    if let Some(entry) = view_data.active_mut(state) {
        entry.selected_row = 0;
    }
}

fn open_menu(state: &mut AppState, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    let Some(entry) = view_data.active(state) else {
        return;
    };
    let command = TableCommand::OpenMenu {
        position: entry.selected_row,
        anchor: MenuAnchor {
            x: u16::try_from(entry.selected_col).unwrap_or(u16::MAX),
            y: u16::try_from(entry.selected_row).unwrap_or(u16::MAX),
        },
    };
    let opened = apply_command(state, view_data, internal_tx, command)
        .iter()
        .any(|event| matches!(event, TableEvent::MenuOpened(_)));
    if opened {
        view_data.menu_cursor = 0;
        state.dispatch(AppCommand::EnterMenu);
    }
}

/// Runs one engine command against the active table and surfaces its
/// outcome on the status line.
fn apply_command(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) -> Vec<TableEvent> {
    let Some(entry) = view_data.active_mut(state) else {
        return Vec::new();
    };
    let new_search = matches!(command, TableCommand::SetSearch(_));
    let result = entry.table.dispatch(command);
    if new_search && entry.table.virtualization_active() {
        entry.selected_row = 0;
        scroll_to_row(entry, 0);
    }
    settle_viewport(entry);
    clamp_cursor(entry);
    match result {
        Ok(events) => {
            if let Some(message) = events.iter().rev().find_map(TableEvent::message) {
                emit_status(state, view_data, internal_tx, message);
            }
            events
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "table command failed");
            emit_status(state, view_data, internal_tx, format!("{error:#}"));
            Vec::new()
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = ScreenKind::ALL
        .iter()
        .position(|screen| *screen == state.active_screen)
        .unwrap_or(0);
    let tabs = Tabs::new(ScreenKind::ALL.iter().map(|screen| screen.label()))
        .block(Block::default().title("fleetdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    if let Some(entry) = view_data.active(state) {
        render_screen(frame, layout[1], state, entry);
        if let ActionMenu::Open { row, .. } = &entry.table.ui().menu {
            render_menu(frame, entry, row, view_data.menu_cursor);
        }
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[2]);
}

fn render_screen(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    entry: &ScreenTable,
) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let view = entry.table.view();
    frame.render_widget(Paragraph::new(search_line(state, entry)), parts[0]);
    render_table(frame, parts[1], entry, &view);
    frame.render_widget(Paragraph::new(footer_line(entry, &view)), parts[2]);
}

fn search_line(state: &AppState, entry: &ScreenTable) -> Line<'static> {
    let options = entry.table.options();
    if !options.searchable {
        return Line::default();
    }
    let term = &entry.table.ui().search_term;
    let editing = state.mode == AppMode::Search;
    if term.is_empty() && !editing {
        return Line::from(Span::styled(
            format!("/ {}", options.search_placeholder),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let cursor = if editing { "_" } else { "" };
    Line::from(vec![
        Span::styled("/ ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{term}{cursor}")),
    ])
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    entry: &ScreenTable,
    view: &TableView<'_>,
) {
    let table = &entry.table;
    let options = table.options();
    let block = Block::default()
        .title(table_title(entry, view))
        .borders(Borders::ALL);

    if view.is_empty() {
        let empty = Paragraph::new(options.empty_message.clone())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut widths = Vec::with_capacity(table.columns().len() + 1);
    let mut header_cells = Vec::with_capacity(table.columns().len() + 1);
    if options.selectable {
        widths.push(Constraint::Length(CHECKBOX_WIDTH));
        header_cells.push(Cell::from(checkbox(table.header_check_state())));
    }
    for (index, column) in table.columns().iter().enumerate() {
        widths.push(Constraint::Min(6));
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if index == entry.selected_col {
            style = style.fg(Color::Cyan);
        }
        let label = header_label_for_column(&column.header_name, &column.field, &table.ui().sort);
        header_cells.push(Cell::from(aligned(label, column.align)).style(style));
    }
    let header = TableRow::new(header_cells);

    let rows = if view.placeholders > 0 {
        (0..view.placeholders)
            .map(|_| {
                let filler = widths
                    .iter()
                    .map(|_| Cell::from("…").style(Style::default().fg(Color::DarkGray)));
                TableRow::new(filler)
            })
            .collect::<Vec<_>>()
    } else {
        view.visible
            .iter()
            .map(|visible| {
                let cursor_row = visible.position == entry.selected_row;
                let mut cells = Vec::with_capacity(widths.len());
                if options.selectable {
                    let state = if table.ui().selection.contains(&visible.key) {
                        CheckState::Checked
                    } else {
                        CheckState::Unchecked
                    };
                    cells.push(Cell::from(checkbox(state)));
                }
                for (index, column) in table.columns().iter().enumerate() {
                    let rendered = format_cell(visible.row, column, &options.date_style);
                    let mut style = rendered_style(&rendered);
                    if cursor_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if cursor_row && index == entry.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    cells.push(Cell::from(aligned(rendered.text(), column.align)).style(style));
                }
                TableRow::new(cells)
            })
            .collect::<Vec<_>>()
    };

    let widget = TableWidget::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_menu(
    frame: &mut ratatui::Frame<'_>,
    entry: &ScreenTable,
    row: &IndexedRow,
    cursor: usize,
) {
    let area = centered_rect(40, 30, frame.area());
    frame.render_widget(Clear, area);
    let lines = entry
        .table
        .options()
        .row_actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let marker = if index == cursor { "> " } else { "  " };
            let style = match action.color {
                Some(tone) => Style::default().fg(tone_color(tone)),
                None => Style::default(),
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{} {}", index + 1, action.label), style),
            ])
        })
        .collect::<Vec<_>>();
    let title = format!("{} actions", row.get("id"));
    let menu = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(menu, area);
}

fn header_label_for_column(header: &str, field: &str, sort: &SortConfig) -> String {
    if sort.key.as_deref() != Some(field) {
        return header.to_owned();
    }
    let suffix = match sort.direction {
        SortDirection::Asc => " ↑",
        SortDirection::Desc => " ↓",
    };
    format!("{header}{suffix}")
}

fn checkbox(state: CheckState) -> &'static str {
    match state {
        CheckState::Unchecked => "[ ]",
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
    }
}

fn aligned(text: String, align: Align) -> Line<'static> {
    let line = Line::from(text);
    match align {
        Align::Left => line,
        Align::Right => line.alignment(Alignment::Right),
        Align::Center => line.alignment(Alignment::Center),
    }
}

fn rendered_style(rendered: &Rendered) -> Style {
    match rendered {
        Rendered::Placeholder => Style::default().fg(Color::DarkGray),
        Rendered::Badge { tone, .. } => Style::default()
            .fg(tone_color(*tone))
            .add_modifier(Modifier::BOLD),
        Rendered::Glyph { tone } => Style::default().fg(tone_color(*tone)),
        Rendered::Text(_) => Style::default(),
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => Color::Green,
        Tone::Error => Color::Red,
        Tone::Warning => Color::Yellow,
        Tone::Neutral => Color::Gray,
    }
}

fn table_title(entry: &ScreenTable, view: &TableView<'_>) -> String {
    let mut title = format!(" {} ", entry.screen.label());
    if view.placeholders > 0 {
        title.push_str("· loading ");
        return title;
    }
    title.push_str(&format!("· {} rows ", view.filtered_count));
    let selected = entry.table.ui().selection.len();
    if selected > 0 {
        title.push_str(&format!("· {selected} selected "));
    }
    if view.window.is_some() {
        title.push_str("· virtual ");
    }
    title
}

fn footer_line(entry: &ScreenTable, view: &TableView<'_>) -> Line<'static> {
    let table = &entry.table;
    let mut spans = Vec::new();
    match view.window {
        Some(window) => {
            let shown = if window.is_empty() {
                "0 of 0".to_owned()
            } else {
                format!("{}-{} of {}", window.start + 1, window.end, view.page_len())
            };
            spans.push(Span::raw(format!("rows {shown}")));
        }
        None if table.options().pagination => {
            let shown = match view.page_span() {
                Some((first, last)) => format!("{first}-{last} of {}", view.filtered_count),
                None => format!("0 of {}", view.filtered_count),
            };
            spans.push(Span::raw(format!(
                "rows {shown} · page {}/{} · {}/page",
                view.page + 1,
                view.page_count.max(1),
                view.rows_per_page
            )));
        }
        None => spans.push(Span::raw(format!("{} rows", view.page_len()))),
    }

    let selected = table.ui().selection.len();
    for (index, action) in table.options().actions.iter().enumerate() {
        let style = if action.is_enabled(selected) {
            match action.variant {
                Some(tone) => Style::default().fg(tone_color(tone)),
                None => Style::default(),
            }
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("{}:{}", index + 1, action.label), style));
    }
    Line::from(spans)
}

fn status_text(state: &AppState) -> String {
    let (mode, keys) = match state.mode {
        AppMode::Nav => (
            "NAV",
            "tab screens | j/k/h/l | s sort | / search | n/p page | +/- size | space/a select | enter actions | 1-9 bulk | v virtual | r reload | q quit",
        ),
        AppMode::Search => ("SEARCH", "type to filter | enter/esc done"),
        AppMode::Menu => ("MENU", "j/k move | enter run | esc close"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {keys}"),
        None => format!("{mode} | {keys}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        ActionSink, FleetAction, InternalEvent, TableRuntime, TableSettings, ViewData,
        body_rows_for, checkbox, footer_line, handle_key_event, handle_resize,
        header_label_for_column, process_internal_events, render, request_reload,
        run_pending_reloads, status_text, table_title,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use fleetdesk_app::{
        AppMode, AppState, CheckState, IndexedRow, Row, ScreenKind, SortConfig, SortDirection,
    };
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        drivers: Vec<Row>,
        load_error: Option<String>,
        applied: Vec<(ScreenKind, FleetAction, usize)>,
    }

    impl TestRuntime {
        fn with_drivers(count: usize) -> Self {
            let drivers = (0..count)
                .map(|n| {
                    Row::new()
                        .with("id", format!("DRV-{n:04}"))
                        .with("name", format!("Driver {n:02}"))
                        .with("role", if n % 4 == 0 { "Mechanic" } else { "Driver" })
                        .with("status", "Active")
                        .with("hourly_rate", 20.0 + n as f64)
                        .with("on_duty", n % 2 == 0)
                })
                .collect();
            Self {
                drivers,
                ..Self::default()
            }
        }

        fn set_status(&mut self, id: &str, status: &str) {
            for row in &mut self.drivers {
                if row.get("id").to_string() == id {
                    row.insert("status", status);
                }
            }
        }
    }

    impl TableRuntime for TestRuntime {
        fn load_rows(&mut self, screen: ScreenKind) -> Result<Vec<Row>> {
            if let Some(error) = &self.load_error {
                return Err(anyhow!("{error}"));
            }
            Ok(match screen {
                ScreenKind::Drivers => self.drivers.clone(),
                _ => Vec::new(),
            })
        }

        fn apply_row_action(
            &mut self,
            screen: ScreenKind,
            action: FleetAction,
            row: &IndexedRow,
        ) -> Result<String> {
            self.applied.push((screen, action, 1));
            if let Some(status) = action.target_status() {
                self.set_status(&row.get("id").to_string(), status);
            }
            Ok(format!("{} {}", action.label(), row.get("id")))
        }

        fn apply_bulk_action(
            &mut self,
            screen: ScreenKind,
            action: FleetAction,
            rows: &[Row],
        ) -> Result<String> {
            self.applied.push((screen, action, rows.len()));
            Ok(format!("{} x{}", action.label(), rows.len()))
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Result<Self> {
            let (tx, rx) = mpsc::channel();
            let sink = ActionSink::new(tx.clone());
            let mut view_data = ViewData::new(&TableSettings::default(), &sink)?;
            for screen in ScreenKind::ALL {
                request_reload(&mut view_data, screen, false);
            }
            handle_resize(&mut view_data, 30);
            let mut harness = Self {
                state: AppState::default(),
                runtime,
                view_data,
                tx,
                rx,
            };
            harness.settle();
            Ok(harness)
        }

        fn settle(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
            run_pending_reloads(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
            );
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.settle();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn drivers(&self) -> &super::ScreenTable {
            &self.view_data.screens[0]
        }

        fn visible_ids(&self) -> Vec<String> {
            self.drivers()
                .table
                .view()
                .visible
                .iter()
                .map(|row| row.row.get("id").to_string())
                .collect()
        }
    }

    #[test]
    fn q_quits_and_tab_cycles_screens() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(3))?;
        assert!(!harness.press(KeyCode::Tab));
        assert_eq!(harness.state.active_screen, ScreenKind::Buses);
        harness.press(KeyCode::BackTab);
        assert_eq!(harness.state.active_screen, ScreenKind::Drivers);
        assert!(harness.press(KeyCode::Char('q')));
        Ok(())
    }

    #[test]
    fn search_mode_edits_term_and_resets_page() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(30))?;
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.drivers().table.ui().page, 1);

        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Search);
        harness.type_text("mechx");
        harness.press(KeyCode::Backspace);
        assert_eq!(harness.drivers().table.ui().search_term, "mech");
        assert_eq!(harness.drivers().table.ui().page, 0);
        assert_eq!(harness.drivers().table.view().filtered_count, 8);

        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Nav);
        Ok(())
    }

    #[test]
    fn s_sorts_the_cursor_column_and_toggles() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(3))?;
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Char('s'));
        harness.press(KeyCode::Char('s'));
        let sort = &harness.drivers().table.ui().sort;
        assert_eq!(sort.key.as_deref(), Some("name"));
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(harness.visible_ids(), vec!["DRV-0002", "DRV-0001", "DRV-0000"]);
        Ok(())
    }

    #[test]
    fn page_size_keys_step_through_offered_sizes() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(60))?;
        harness.press(KeyCode::Char('n'));
        harness.press(KeyCode::Char('+'));
        assert_eq!(harness.drivers().table.ui().rows_per_page, 25);
        assert_eq!(harness.drivers().table.ui().page, 0);
        harness.press(KeyCode::Char('-'));
        harness.press(KeyCode::Char('-'));
        assert_eq!(harness.drivers().table.ui().rows_per_page, 5);
        Ok(())
    }

    #[test]
    fn space_and_a_drive_selection() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(12))?;
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.drivers().table.selected_positions(), vec![1]);
        assert_eq!(
            harness.drivers().table.header_check_state(),
            CheckState::Indeterminate
        );

        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.drivers().table.ui().selection.len(), 10);
        harness.press(KeyCode::Char('a'));
        assert!(harness.drivers().table.ui().selection.is_empty());
        Ok(())
    }

    #[test]
    fn enter_opens_menu_and_action_reaches_runtime() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(4))?;
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Menu);
        assert!(harness.drivers().table.ui().menu.is_open());

        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(!harness.drivers().table.ui().menu.is_open());
        assert_eq!(
            harness.runtime.applied,
            vec![(ScreenKind::Drivers, FleetAction::Suspend, 1)]
        );
        assert_eq!(
            harness.drivers().table.data()[1].get("status").to_string(),
            "Inactive"
        );
        assert_eq!(harness.state.status_line.as_deref(), Some("Suspend DRV-0001"));
        Ok(())
    }

    #[test]
    fn esc_closes_menu_without_running_anything() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(2))?;
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('j'));
        assert_eq!(harness.view_data.menu_cursor, 1);
        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.runtime.applied.is_empty());
        Ok(())
    }

    #[test]
    fn bulk_action_keys_respect_selection_requirement() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(5))?;
        harness.press(KeyCode::Char('1'));
        assert!(harness.runtime.applied.is_empty());
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("Suspend needs a selection")
        );

        harness.press(KeyCode::Char('a'));
        harness.press(KeyCode::Char('1'));
        harness.press(KeyCode::Char('2'));
        assert_eq!(
            harness.runtime.applied,
            vec![
                (ScreenKind::Drivers, FleetAction::Suspend, 5),
                (ScreenKind::Drivers, FleetAction::Summarize, 5),
            ]
        );
        Ok(())
    }

    #[test]
    fn v_switches_to_virtual_scrolling_and_back() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(200))?;
        assert_eq!(harness.drivers().hub.listener_count(), 0);

        harness.press(KeyCode::Char('v'));
        assert!(harness.drivers().table.virtualization_active());
        assert_eq!(harness.drivers().hub.listener_count(), 2);
        assert_eq!(harness.view_data.screens[1].hub.listener_count(), 0);
        let view = harness.drivers().table.view();
        let window = view.window.expect("virtual window");
        assert_eq!(window.start, 0);
        assert_eq!(view.page_len(), 200);

        harness.press_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        let scrolled = harness.drivers().table.view().window.expect("virtual window");
        assert_eq!(scrolled.start, usize::from(body_rows_for(30) / 2));

        harness.press(KeyCode::Char('v'));
        assert!(!harness.drivers().table.virtualization_active());
        assert_eq!(harness.drivers().hub.listener_count(), 0);
        assert_eq!(harness.drivers().table.view().page_len(), 10);
        Ok(())
    }

    #[test]
    fn cursor_moves_keep_virtual_window_on_cursor() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(100))?;
        harness.press(KeyCode::Char('v'));
        let shown = usize::from(body_rows_for(30));
        for _ in 0..shown + 3 {
            harness.press(KeyCode::Char('j'));
        }
        let entry = harness.drivers();
        let window = entry.table.view().window.expect("virtual window");
        assert!(window.start <= entry.selected_row);
        assert!(entry.selected_row < window.end);
        Ok(())
    }

    #[test]
    fn searching_after_scrolling_shows_matches_from_the_top() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(200))?;
        harness.press(KeyCode::Char('v'));
        for _ in 0..15 {
            harness.press_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        }
        let scrolled = harness.drivers().table.view().window.expect("virtual window");
        assert!(scrolled.start > 50);

        harness.press(KeyCode::Char('/'));
        harness.type_text("mech");
        harness.press(KeyCode::Enter);

        let entry = harness.drivers();
        let view = entry.table.view();
        assert_eq!(view.filtered_count, 50);
        let window = view.window.expect("virtual window");
        assert_eq!(window.start, 0);
        assert!(!view.visible.is_empty());
        assert_eq!(entry.selected_row, 0);
        assert_eq!(harness.visible_ids()[0], "DRV-0000");
        Ok(())
    }

    #[test]
    fn shrinking_reload_pulls_virtual_window_back_onto_rows() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(200))?;
        harness.press(KeyCode::Char('v'));
        for _ in 0..15 {
            harness.press_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        }
        harness.runtime.drivers.truncate(12);
        harness.press(KeyCode::Char('r'));

        let entry = harness.drivers();
        let view = entry.table.view();
        let window = view.window.expect("virtual window");
        assert_eq!(view.page_len(), 12);
        assert!(window.start < 12);
        assert!(!view.visible.is_empty());
        assert!(entry.selected_row < 12);
        Ok(())
    }

    #[test]
    fn reload_shows_loading_until_rows_arrive() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(5))?;
        handle_key_event(
            &mut harness.state,
            &mut harness.view_data,
            &harness.tx,
            KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE),
        );
        {
            let entry = harness.drivers();
            let view = entry.table.view();
            assert_eq!(view.placeholders, 10);
            assert_eq!(table_title(entry, &view), " Drivers · loading ");
        }

        let reloaded = run_pending_reloads(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        );
        assert!(reloaded);
        assert!(!harness.drivers().table.options().loading);
        assert_eq!(harness.drivers().table.view().page_len(), 5);
        assert_eq!(harness.state.status_line.as_deref(), Some("drivers reloaded"));
        assert!(!run_pending_reloads(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
        ));
        Ok(())
    }

    #[test]
    fn reload_failure_is_reported() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(2))?;
        harness.runtime.load_error = Some("store offline".to_owned());
        harness.press(KeyCode::Char('r'));
        let status = harness.state.status_line.clone().unwrap_or_default();
        assert!(status.contains("load drivers"), "{status}");
        assert!(status.contains("store offline"), "{status}");
        assert!(!harness.drivers().table.options().loading);
        Ok(())
    }

    #[test]
    fn header_label_marks_sorted_column() {
        let sort = SortConfig::by("name", SortDirection::Asc);
        assert_eq!(header_label_for_column("Name", "name", &sort), "Name ↑");
        assert_eq!(header_label_for_column("Role", "role", &sort), "Role");
        let desc = SortConfig::by("name", SortDirection::Desc);
        assert_eq!(header_label_for_column("Name", "name", &desc), "Name ↓");
    }

    #[test]
    fn checkbox_reflects_tri_state() {
        assert_eq!(checkbox(CheckState::Unchecked), "[ ]");
        assert_eq!(checkbox(CheckState::Checked), "[x]");
        assert_eq!(checkbox(CheckState::Indeterminate), "[-]");
    }

    #[test]
    fn footer_and_title_describe_the_page() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(25))?;
        harness.press(KeyCode::Char('n'));
        harness.press(KeyCode::Char('n'));
        let entry = harness.drivers();
        let view = entry.table.view();
        let footer = footer_line(entry, &view).to_string();
        assert!(footer.starts_with("rows 21-25 of 25 · page 3/3 · 10/page"), "{footer}");
        assert!(footer.contains("1:Suspend"));
        assert!(footer.contains("2:Summarize"));
        assert_eq!(table_title(entry, &view), " Drivers · 25 rows ");
        Ok(())
    }

    #[test]
    fn empty_screen_renders_empty_message() -> Result<()> {
        let mut harness = Harness::new(TestRuntime::with_drivers(0))?;
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend)?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        let buffer = terminal.backend().buffer().clone();
        let text = buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(text.contains("No drivers available"));

        harness.press(KeyCode::Tab);
        assert_eq!(harness.state.active_screen, ScreenKind::Buses);
        Ok(())
    }

    #[test]
    fn status_text_shows_mode_and_message() {
        let mut state = AppState::default();
        assert!(status_text(&state).starts_with("NAV | tab screens"));
        state.mode = AppMode::Menu;
        state.status_line = Some("menu closed".to_owned());
        assert!(status_text(&state).starts_with("MENU | menu closed | j/k move"));
    }

    #[test]
    fn body_rows_never_reach_zero() {
        assert_eq!(body_rows_for(0), 1);
        assert_eq!(body_rows_for(40), 30);
    }
}
