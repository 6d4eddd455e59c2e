// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use fleetdesk_app::{
    CheckState, Column, ColumnType, Rendered, SortConfig, SortDirection, Table, TableCommand,
    TableOptions, Tone, filter_rows, format_cell, sort_rows,
};
use fleetdesk_testkit::{FleetFaker, FleetSize, demo_fleet};

fn driver_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("name", "Name"),
        Column::new("role", "Role"),
        Column::new("status", "Status").kind(ColumnType::Status),
        Column::new("hourly_rate", "Rate").kind(ColumnType::Currency),
        Column::new("hire_date", "Hired").kind(ColumnType::Date),
        Column::new("on_duty", "On duty").kind(ColumnType::Boolean),
    ]
}

fn driver_table() -> Table {
    Table::new(
        driver_columns(),
        TableOptions {
            selectable: true,
            id_field: Some("id".to_owned()),
            ..TableOptions::default()
        },
    )
    .with_data(demo_fleet().drivers)
}

#[test]
fn every_sortable_column_reverses_cleanly() {
    let fleet = FleetFaker::new(99).fleet(FleetSize::default());
    let columns = driver_columns();
    let filtered = filter_rows(&fleet.drivers, &columns, "");

    // Ids are unique, so sorting by id has no ties to keep stable.
    let asc = sort_rows(&filtered, &columns, &SortConfig::by("id", SortDirection::Asc));
    let desc = sort_rows(&filtered, &columns, &SortConfig::by("id", SortDirection::Desc));
    let mut reversed = asc.clone();
    reversed.reverse();
    assert_eq!(desc, reversed);

    for column in &columns {
        let sorted = sort_rows(
            &filtered,
            &columns,
            &SortConfig::by(column.field.as_str(), SortDirection::Asc),
        );
        let mut indexes = sorted.iter().map(|row| row.index).collect::<Vec<_>>();
        indexes.sort_unstable();
        assert_eq!(
            indexes,
            (0..fleet.drivers.len()).collect::<Vec<_>>(),
            "column {}",
            column.field
        );
    }
}

#[test]
fn currency_sort_is_numeric_over_generated_rates() {
    let fleet = demo_fleet();
    let columns = driver_columns();
    let filtered = filter_rows(&fleet.drivers, &columns, "");
    let sorted = sort_rows(
        &filtered,
        &columns,
        &SortConfig::by("hourly_rate", SortDirection::Asc),
    );
    let rates = sorted
        .iter()
        .filter_map(|row| row.row.get("hourly_rate").as_number())
        .collect::<Vec<_>>();
    assert!(rates.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn paging_through_everything_visits_each_driver_once() -> Result<()> {
    let mut table = driver_table();
    let total = table.data().len();
    let mut seen = Vec::new();
    loop {
        let view = table.view();
        seen.extend(view.page_rows.iter().map(|row| row.key.clone()));
        if view.page + 1 >= view.page_count {
            break;
        }
        table.dispatch(TableCommand::NextPage)?;
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
    Ok(())
}

#[test]
fn search_then_select_all_stays_within_results() -> Result<()> {
    let mut table = driver_table();
    table.dispatch(TableCommand::SetSearch("mechanic".to_owned()))?;
    table.dispatch(TableCommand::ToggleAll(true))?;

    let view = table.view();
    assert!(table.ui().selection.len() <= view.page_len());
    assert_eq!(table.header_check_state(), if view.page_len() == 0 {
        CheckState::Unchecked
    } else {
        CheckState::Checked
    });
    for row in table.bulk_selection().rows {
        assert_eq!(row.get("role").to_string(), "Mechanic");
    }
    Ok(())
}

#[test]
fn generated_cells_render_without_gaps() {
    let fleet = demo_fleet();
    let columns = driver_columns();
    let dates = TableOptions::default().date_style;
    for row in &fleet.drivers {
        for column in &columns {
            let rendered = format_cell(row, column, &dates);
            match column.kind {
                ColumnType::Status => {
                    assert!(matches!(rendered, Rendered::Badge { .. }), "{rendered:?}");
                }
                ColumnType::Boolean => {
                    assert!(matches!(
                        rendered,
                        Rendered::Glyph {
                            tone: Tone::Success | Tone::Error
                        }
                    ));
                }
                ColumnType::Currency => assert!(rendered.text().starts_with('$')),
                ColumnType::Date => assert!(rendered.text().contains('/')),
                ColumnType::Plain => assert_ne!(rendered, Rendered::Placeholder),
            }
        }
    }
}
