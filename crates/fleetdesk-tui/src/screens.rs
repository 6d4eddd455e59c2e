// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fleetdesk_app::{
    Align, BulkAction, BulkSelection, Column, ColumnType, DateStyle, IndexedRow, RequestId,
    Rendered, Row, RowAction, ScreenKind, Table, TableOptions, Tone, Value, format_usd,
    group_thousands,
};
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::mpsc::Sender;

use crate::InternalEvent;

/// Mutations the front end can ask the record store for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetAction {
    Suspend,
    Reactivate,
    ScheduleService,
    Retire,
    ActivateRoute,
    DeactivateRoute,
    CancelTrip,
    CompleteTrip,
    Summarize,
}

impl FleetAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Suspend => "Suspend",
            Self::Reactivate => "Reactivate",
            Self::ScheduleService => "Schedule service",
            Self::Retire => "Retire",
            Self::ActivateRoute => "Activate",
            Self::DeactivateRoute => "Deactivate",
            Self::CancelTrip => "Cancel",
            Self::CompleteTrip => "Mark completed",
            Self::Summarize => "Summarize",
        }
    }

    /// Status value the action writes, if it writes one.
    pub const fn target_status(self) -> Option<&'static str> {
        match self {
            Self::Suspend | Self::Retire | Self::DeactivateRoute => Some("Inactive"),
            Self::Reactivate | Self::ActivateRoute => Some("Active"),
            Self::ScheduleService => Some("Maintenance"),
            Self::CancelTrip => Some("Cancelled"),
            Self::CompleteTrip => Some("Completed"),
            Self::Summarize => None,
        }
    }

    const fn tone(self) -> Option<Tone> {
        match self {
            Self::Suspend | Self::Retire | Self::DeactivateRoute | Self::CancelTrip => {
                Some(Tone::Error)
            }
            Self::Reactivate | Self::ActivateRoute | Self::CompleteTrip => Some(Tone::Success),
            Self::ScheduleService => Some(Tone::Warning),
            Self::Summarize => None,
        }
    }
}

/// Table tuning shared by every screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    pub rows_per_page: usize,
    pub page_sizes: Vec<usize>,
    pub virtualize: bool,
    pub row_height: u32,
    pub overscan: usize,
    pub date_style: DateStyle,
}

impl Default for TableSettings {
    fn default() -> Self {
        let defaults = TableOptions::default();
        Self {
            rows_per_page: defaults.rows_per_page,
            page_sizes: defaults.rows_per_page_options,
            virtualize: defaults.virtualize,
            row_height: defaults.virtual_row_height,
            overscan: defaults.overscan,
            date_style: defaults.date_style,
        }
    }
}

/// Hands out request ids and posts action requests to the event loop.
#[derive(Debug, Clone)]
pub struct ActionSink {
    tx: Sender<InternalEvent>,
    next_id: Arc<AtomicU64>,
}

impl ActionSink {
    pub fn new(tx: Sender<InternalEvent>) -> Self {
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_id(&self) -> RequestId {
        RequestId::new(self.next_id.fetch_add(1, AtomicOrdering::Relaxed) + 1)
    }

    fn post(&self, event: InternalEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("action request channel closed"))
    }
}

pub fn columns_for(screen: ScreenKind) -> Vec<Column> {
    match screen {
        ScreenKind::Drivers => vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("role", "Role"),
            Column::new("status", "Status").kind(ColumnType::Status),
            Column::new("license_class", "License"),
            Column::new("hourly_rate", "Rate").kind(ColumnType::Currency),
            Column::new("hire_date", "Hired").kind(ColumnType::Date),
            Column::new("on_duty", "On duty").kind(ColumnType::Boolean),
        ],
        ScreenKind::Buses => vec![
            Column::new("id", "ID"),
            Column::new("plate", "Plate"),
            Column::new("model", "Model"),
            Column::new("capacity", "Seats").align(Align::Right),
            Column::new("depot", "Depot"),
            Column::new("status", "Status").kind(ColumnType::Status),
            Column::new("mileage", "Mileage")
                .align(Align::Right)
                .render(Arc::new(|value: &Value, _: &Row| with_unit(value, "mi"))),
            Column::new("last_service", "Serviced").kind(ColumnType::Date),
            Column::new("accessible", "Ramp").kind(ColumnType::Boolean),
        ],
        ScreenKind::Routes => vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("origin", "From"),
            Column::new("destination", "To"),
            Column::new("stops", "Stops").align(Align::Right),
            Column::new("distance_km", "Distance")
                .align(Align::Right)
                .render(Arc::new(|value: &Value, _: &Row| with_unit(value, "km"))),
            Column::new("base_fare", "Fare").kind(ColumnType::Currency),
            Column::new("status", "Status").kind(ColumnType::Status),
        ],
        ScreenKind::Trips => vec![
            Column::new("id", "ID"),
            Column::new("service_date", "Date").kind(ColumnType::Date),
            Column::new("departure", "Departs"),
            Column::new("route", "Route"),
            Column::new("bus_id", "Bus"),
            Column::new("driver", "Driver"),
            Column::new("passengers", "Riders").align(Align::Right),
            Column::new("revenue", "Revenue").kind(ColumnType::Currency),
            Column::new("status", "Status")
                .kind(ColumnType::Status)
                .comparator(Arc::new(compare_trip_status)),
        ],
    }
}

pub fn row_actions_for(screen: ScreenKind) -> &'static [FleetAction] {
    match screen {
        ScreenKind::Drivers => &[FleetAction::Suspend, FleetAction::Reactivate],
        ScreenKind::Buses => &[FleetAction::ScheduleService, FleetAction::Retire],
        ScreenKind::Routes => &[FleetAction::ActivateRoute, FleetAction::DeactivateRoute],
        ScreenKind::Trips => &[FleetAction::CompleteTrip, FleetAction::CancelTrip],
    }
}

pub fn bulk_actions_for(screen: ScreenKind) -> &'static [FleetAction] {
    match screen {
        ScreenKind::Drivers => &[FleetAction::Suspend, FleetAction::Summarize],
        ScreenKind::Buses => &[FleetAction::ScheduleService, FleetAction::Summarize],
        ScreenKind::Routes => &[FleetAction::DeactivateRoute, FleetAction::Summarize],
        ScreenKind::Trips => &[FleetAction::CancelTrip, FleetAction::Summarize],
    }
}

/// Builds the engine table for one screen. Action handlers only post a
/// request; the event loop hands it to the runtime.
pub fn screen_table(screen: ScreenKind, settings: &TableSettings, sink: &ActionSink) -> Table {
    let row_actions = row_actions_for(screen)
        .iter()
        .map(|action| {
            let action = *action;
            let sink = sink.clone();
            let mut entry = RowAction::new(
                action.label(),
                Arc::new(move |row: &IndexedRow| {
                    sink.post(InternalEvent::RowAction {
                        id: sink.next_id(),
                        screen,
                        action,
                        row: row.clone(),
                    })
                }),
            );
            if let Some(tone) = action.tone() {
                entry = entry.color(tone);
            }
            entry
        })
        .collect();

    let actions = bulk_actions_for(screen)
        .iter()
        .map(|action| {
            let action = *action;
            let sink = sink.clone();
            let mut entry = BulkAction::new(
                action.label(),
                Arc::new(move |selection: &BulkSelection| {
                    sink.post(InternalEvent::BulkAction {
                        id: sink.next_id(),
                        screen,
                        action,
                        rows: selection.rows.clone(),
                    })
                }),
            )
            .requires_selection(action.target_status().is_some());
            if let Some(tone) = action.tone() {
                entry = entry.variant(tone);
            }
            entry
        })
        .collect();

    let rows_per_page = if settings.page_sizes.contains(&settings.rows_per_page) {
        settings.rows_per_page
    } else {
        settings
            .page_sizes
            .first()
            .copied()
            .unwrap_or(settings.rows_per_page)
    };

    Table::new(
        columns_for(screen),
        TableOptions {
            selectable: true,
            virtualize: settings.virtualize,
            pagination: !settings.virtualize,
            actions,
            row_actions,
            empty_message: format!("No {} available", screen.as_str()),
            search_placeholder: format!("Search {}...", screen.as_str()),
            virtual_row_height: settings.row_height,
            overscan: settings.overscan,
            rows_per_page_options: settings.page_sizes.clone(),
            rows_per_page,
            id_field: Some("id".to_owned()),
            date_style: settings.date_style.clone(),
            ..TableOptions::default()
        },
    )
}

fn with_unit(value: &Value, unit: &str) -> Rendered {
    match value.as_number() {
        Some(number) if number.fract() == 0.0 => {
            let sign = if number < 0.0 { "-" } else { "" };
            let grouped = group_thousands(number.abs() as u64);
            Rendered::Text(format!("{sign}{grouped} {unit}"))
        }
        Some(number) => Rendered::Text(format!("{number:.1} {unit}")),
        None if value.is_null() => Rendered::Placeholder,
        None => Rendered::Text(value.to_string()),
    }
}

// Lifecycle order for trip statuses; unknown labels go last.
fn trip_stage(value: &Value) -> u8 {
    match value.to_string().to_lowercase().as_str() {
        "pending" => 0,
        "active" => 1,
        "completed" => 2,
        "cancelled" => 3,
        _ => 4,
    }
}

fn compare_trip_status(left: &Value, right: &Value) -> Ordering {
    trip_stage(left).cmp(&trip_stage(right))
}

/// Summary line for a bulk selection, with a money total when the screen
/// has one.
pub fn summarize(screen: ScreenKind, rows: &[Row]) -> String {
    let Some(field) = money_field(screen) else {
        return format!("{} rows selected", rows.len());
    };
    let total = rows
        .iter()
        .filter_map(|row| row.get(field).as_amount())
        .sum::<f64>();
    format!("{} rows selected, {field} {}", rows.len(), format_usd(total))
}

fn money_field(screen: ScreenKind) -> Option<&'static str> {
    match screen {
        ScreenKind::Drivers => Some("hourly_rate"),
        ScreenKind::Buses => None,
        ScreenKind::Routes => Some("base_fare"),
        ScreenKind::Trips => Some("revenue"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActionSink, FleetAction, TableSettings, bulk_actions_for, columns_for,
        compare_trip_status, row_actions_for, screen_table, summarize, with_unit,
    };
    use crate::InternalEvent;
    use anyhow::Result;
    use fleetdesk_app::{
        MenuAnchor, Rendered, Row, ScreenKind, SortDirection, TableCommand, TableEvent, Value,
    };
    use std::cmp::Ordering;
    use std::sync::mpsc;

    fn trips() -> Vec<Row> {
        vec![
            Row::new().with("id", "TRP-1").with("status", "Completed").with("revenue", 12.5),
            Row::new().with("id", "TRP-2").with("status", "Pending").with("revenue", 0.0),
            Row::new().with("id", "TRP-3").with("status", "Cancelled").with("revenue", 0.0),
            Row::new().with("id", "TRP-4").with("status", "Active").with("revenue", 30.0),
        ]
    }

    #[test]
    fn every_screen_has_columns_and_actions() {
        for screen in ScreenKind::ALL {
            assert!(!columns_for(screen).is_empty());
            assert!(!row_actions_for(screen).is_empty());
            assert!(!bulk_actions_for(screen).is_empty());
        }
    }

    #[test]
    fn trip_status_sorts_by_lifecycle() -> Result<()> {
        let (tx, _rx) = mpsc::channel();
        let mut table = screen_table(
            ScreenKind::Trips,
            &TableSettings::default(),
            &ActionSink::new(tx),
        )
        .with_data(trips());
        table.dispatch(TableCommand::Sort("status".to_owned()))?;
        let ids = table
            .view()
            .visible
            .iter()
            .map(|row| row.row.get("id").to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["TRP-2", "TRP-4", "TRP-1", "TRP-3"]);

        table.dispatch(TableCommand::Sort("status".to_owned()))?;
        assert_eq!(table.ui().sort.direction, SortDirection::Desc);
        assert_eq!(
            compare_trip_status(&Value::from("odd"), &Value::from("Pending")),
            Ordering::Greater
        );
        Ok(())
    }

    #[test]
    fn row_action_posts_request_with_row() -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut table = screen_table(
            ScreenKind::Trips,
            &TableSettings::default(),
            &ActionSink::new(tx),
        )
        .with_data(trips());
        table.dispatch(TableCommand::OpenMenu {
            position: 1,
            anchor: MenuAnchor::default(),
        })?;
        let events = table.dispatch(TableCommand::SelectRowAction(1))?;
        assert!(events.contains(&TableEvent::RowActionInvoked("Cancel".to_owned())));

        match rx.try_recv()? {
            InternalEvent::RowAction {
                id,
                screen,
                action,
                row,
            } => {
                assert_eq!(id.get(), 1);
                assert_eq!(screen, ScreenKind::Trips);
                assert_eq!(action, FleetAction::CancelTrip);
                assert_eq!(row.index, 1);
                assert_eq!(row.get("id").to_string(), "TRP-2");
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn status_bulk_actions_need_a_selection() -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut table = screen_table(
            ScreenKind::Trips,
            &TableSettings::default(),
            &ActionSink::new(tx),
        )
        .with_data(trips());
        let events = table.dispatch(TableCommand::RunBulkAction(0))?;
        assert_eq!(events, vec![TableEvent::BulkActionDisabled("Cancel".to_owned())]);
        assert!(rx.try_recv().is_err());

        table.dispatch(TableCommand::RunBulkAction(1))?;
        assert!(matches!(
            rx.try_recv()?,
            InternalEvent::BulkAction {
                action: FleetAction::Summarize,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn settings_page_size_falls_back_to_first_offered() {
        let (tx, _rx) = mpsc::channel();
        let settings = TableSettings {
            rows_per_page: 7,
            page_sizes: vec![20, 40],
            ..TableSettings::default()
        };
        let table = screen_table(ScreenKind::Routes, &settings, &ActionSink::new(tx));
        assert_eq!(table.ui().rows_per_page, 20);
    }

    #[test]
    fn unit_renderer_groups_whole_numbers() {
        assert_eq!(
            with_unit(&Value::from(123_456_i64), "mi"),
            Rendered::Text("123,456 mi".to_owned())
        );
        assert_eq!(
            with_unit(&Value::from(12.34), "km"),
            Rendered::Text("12.3 km".to_owned())
        );
        assert_eq!(with_unit(&Value::Null, "km"), Rendered::Placeholder);
    }

    #[test]
    fn summary_totals_money_where_the_screen_has_it() {
        assert_eq!(
            summarize(ScreenKind::Trips, &trips()),
            "4 rows selected, revenue $42.50"
        );
        assert_eq!(summarize(ScreenKind::Buses, &trips()), "4 rows selected");
        assert_eq!(
            summarize(ScreenKind::Trips, &[]),
            "0 rows selected, revenue $0.00"
        );
    }
}
