// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use fleetdesk_app::{Row, ScreenKind, Value};
use std::path::PathBuf;
use time::macros::date;
use time::{Date, Duration};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const STAFF_ROLES: [&str; 4] = ["Driver", "Dispatcher", "Mechanic", "Admin"];
const STAFF_STATUSES: [&str; 4] = ["Active", "Active", "Inactive", "Pending"];
const LICENSE_CLASSES: [&str; 3] = ["CDL-A", "CDL-B", "CDL-C"];

const BUS_MODELS: [&str; 8] = [
    "Gillig Low Floor",
    "New Flyer Xcelsior",
    "Nova LFS",
    "Proterra ZX5",
    "MCI D4505",
    "Prevost H3-45",
    "ElDorado Axess",
    "BYD K9",
];
const BUS_STATUSES: [&str; 4] = ["Active", "Active", "Maintenance", "Inactive"];
const DEPOTS: [&str; 5] = ["North Yard", "South Yard", "Central", "Airport", "Riverside"];
const PLATE_STATES: [&str; 6] = ["TX", "WA", "CO", "OR", "AZ", "NC"];

const STOPS: [&str; 14] = [
    "Union Station",
    "Airport Terminal",
    "City Hall",
    "Riverside Park",
    "University",
    "Medical Center",
    "Harbor Point",
    "Old Town",
    "Tech Campus",
    "Stadium",
    "Lakeview Mall",
    "Westgate",
    "Eastside Depot",
    "Convention Center",
];
const ROUTE_KINDS: [&str; 4] = ["Express", "Local", "Shuttle", "Night Owl"];
const ROUTE_STATUSES: [&str; 3] = ["Active", "Active", "Inactive"];

const TRIP_STATUSES: [&str; 5] = ["Completed", "Completed", "Pending", "Active", "Cancelled"];

const REFERENCE_DATE: Date = date!(2026 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Record counts for a generated fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetSize {
    pub drivers: usize,
    pub buses: usize,
    pub routes: usize,
    pub trips: usize,
}

impl Default for FleetSize {
    fn default() -> Self {
        Self {
            drivers: 48,
            buses: 30,
            routes: 12,
            trips: 240,
        }
    }
}

/// One generated data set, one record list per screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fleet {
    pub drivers: Vec<Row>,
    pub buses: Vec<Row>,
    pub routes: Vec<Row>,
    pub trips: Vec<Row>,
}

impl Fleet {
    pub fn rows(&self, screen: ScreenKind) -> &[Row] {
        match screen {
            ScreenKind::Drivers => &self.drivers,
            ScreenKind::Buses => &self.buses,
            ScreenKind::Routes => &self.routes,
            ScreenKind::Trips => &self.trips,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FleetFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl FleetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Generates every screen's records. Trips reference the generated
    /// routes, buses, and drivers by id.
    pub fn fleet(&mut self, size: FleetSize) -> Fleet {
        let drivers = (0..size.drivers)
            .map(|n| self.driver(n))
            .collect::<Vec<_>>();
        let buses = (0..size.buses).map(|n| self.bus(n)).collect::<Vec<_>>();
        let routes = (0..size.routes).map(|n| self.route(n)).collect::<Vec<_>>();
        let trips = (0..size.trips)
            .map(|n| self.trip(n, &drivers, &buses, &routes))
            .collect::<Vec<_>>();
        Fleet {
            drivers,
            buses,
            routes,
            trips,
        }
    }

    pub fn driver(&mut self, n: usize) -> Row {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let role = self.pick(&STAFF_ROLES);
        let license = if role == "Driver" {
            Value::from(self.pick(&LICENSE_CLASSES))
        } else {
            Value::Null
        };
        Row::new()
            .with("id", format!("DRV-{:04}", n + 1))
            .with("name", format!("{first} {last}"))
            .with(
                "email",
                format!(
                    "{}.{}@fleetdesk.test",
                    first.to_lowercase(),
                    last.to_lowercase()
                ),
            )
            .with("phone", self.phone())
            .with("role", role)
            .with("license_class", license)
            .with("status", self.pick(&STAFF_STATUSES))
            .with("hourly_rate", self.amount(18.0, 42.0))
            .with("hire_date", self.date_before(REFERENCE_DATE, 365 * 12))
            .with("on_duty", self.rng.bool())
    }

    pub fn bus(&mut self, n: usize) -> Row {
        let last_service = if self.rng.int_n(8) == 0 {
            Value::Null
        } else {
            Value::from(self.date_before(REFERENCE_DATE, 365))
        };
        Row::new()
            .with("id", format!("BUS-{:03}", n + 101))
            .with("plate", self.plate())
            .with("model", self.pick(&BUS_MODELS))
            .with("capacity", self.int_range(24, 80))
            .with("depot", self.pick(&DEPOTS))
            .with("status", self.pick(&BUS_STATUSES))
            .with("mileage", self.int_range(2_000, 420_000))
            .with("last_service", last_service)
            .with("accessible", self.rng.int_n(5) != 0)
    }

    pub fn route(&mut self, n: usize) -> Row {
        let origin = self.pick(&STOPS);
        let mut destination = self.pick(&STOPS);
        while destination == origin {
            destination = self.pick(&STOPS);
        }
        let kind = self.pick(&ROUTE_KINDS);
        Row::new()
            .with("id", format!("RT-{:02}", n + 1))
            .with("name", format!("{origin} {kind}"))
            .with("origin", origin)
            .with("destination", destination)
            .with("stops", self.int_range(4, 38))
            .with("distance_km", self.amount(3.0, 64.0))
            .with("base_fare", self.amount(1.25, 9.5))
            .with("status", self.pick(&ROUTE_STATUSES))
    }

    pub fn trip(&mut self, n: usize, drivers: &[Row], buses: &[Row], routes: &[Row]) -> Row {
        let route = self.pick_row(routes);
        let status = self.pick(&TRIP_STATUSES);
        let passengers = if status == "Cancelled" {
            0
        } else {
            self.int_range(0, 78)
        };
        let fare = route
            .and_then(|route| route.get("base_fare").as_number())
            .unwrap_or(2.5);
        let hour = self.int_range(5, 23);
        let minute = self.int_range(0, 11) * 5;
        Row::new()
            .with("id", format!("TRP-{:05}", n + 1))
            .with("route", field_of(route, "name"))
            .with("route_id", field_of(route, "id"))
            .with("bus_id", field_of(self.pick_row(buses), "id"))
            .with("driver", field_of(self.pick_row(drivers), "name"))
            .with("departure", format!("{hour:02}:{minute:02}"))
            .with("service_date", self.date_before(REFERENCE_DATE, 90))
            .with("passengers", passengers)
            .with("revenue", (passengers as f64 * fare * 100.0).round() / 100.0)
            .with("status", status)
    }

    pub fn date_before(&mut self, anchor: Date, max_days: i64) -> Date {
        let back = self.int_range(0, max_days);
        anchor.checked_sub(Duration::days(back)).unwrap_or(anchor)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn pick_row<'a>(&mut self, rows: &'a [Row]) -> Option<&'a Row> {
        rows.get(self.rng.int_n(rows.len()))
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn amount(&mut self, min: f64, max: f64) -> f64 {
        let cents = self.int_range((min * 100.0) as i64, (max * 100.0) as i64);
        cents as f64 / 100.0
    }

    fn phone(&mut self) -> String {
        format!(
            "({}) 555-{:04}",
            self.int_range(201, 989),
            self.int_range(0, 9999)
        )
    }

    fn plate(&mut self) -> String {
        let state = self.pick(&PLATE_STATES);
        let letters = (0..2)
            .map(|_| char::from(b'A' + self.rng.int_n(26) as u8))
            .collect::<String>();
        format!("{state} {}-{letters}", self.int_range(1000, 9999))
    }
}

fn field_of(row: Option<&Row>, field: &str) -> Value {
    row.map(|row| row.get(field).clone()).unwrap_or(Value::Null)
}

/// Demo data set shared by the CLI and integration tests.
pub fn demo_fleet() -> Fleet {
    FleetFaker::new(2026).fleet(FleetSize::default())
}

pub fn temp_data_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("data");
    std::fs::create_dir_all(&path).context("create temp data dir")?;
    Ok((dir, path))
}

pub fn reference_date() -> Date {
    REFERENCE_DATE
}
