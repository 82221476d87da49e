//! CSV export of the currently filtered record set.
//!
//! Column order, labels, and decimal precision match the dashboard tables.
//! The blob is built in memory; writing it to disk is a thin helper so the
//! app layer can instead hand the text to a download mechanism.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::model::{EmissionRecord, EngineRecord, FuelRecord, RecordKind, Vehicle};

/// One export column: header label plus a formatter for the cell value.
struct Column<R> {
    label: &'static str,
    value: fn(&R) -> String,
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

const FUEL_COLUMNS: &[Column<FuelRecord>] = &[
    Column { label: "Date", value: |r| r.date.clone() },
    Column { label: "Vehicle ID", value: |r| r.vehicle_id.clone() },
    Column { label: "Fuel Amount (gal)", value: |r| fixed(r.amount, 1) },
    Column { label: "Distance (mi)", value: |r| fixed(r.distance, 1) },
    Column { label: "MPG", value: |r| fixed(r.mpg, 1) },
    Column { label: "Cost ($)", value: |r| fixed(r.cost, 2) },
];

const ENGINE_COLUMNS: &[Column<EngineRecord>] = &[
    Column { label: "Date", value: |r| r.date.clone() },
    Column { label: "Vehicle ID", value: |r| r.vehicle_id.clone() },
    Column { label: "Temperature (°F)", value: |r| fixed(r.temperature, 1) },
    Column { label: "RPM", value: |r| fixed(r.rpm, 0) },
    Column { label: "Idling Time (sec)", value: |r| fixed(r.idling_time, 0) },
];

const EMISSION_COLUMNS: &[Column<EmissionRecord>] = &[
    Column { label: "Date", value: |r| r.date.clone() },
    Column { label: "Vehicle ID", value: |r| r.vehicle_id.clone() },
    Column { label: "CO2 (g/km)", value: |r| fixed(r.co2, 1) },
    Column { label: "NOx (g/km)", value: |r| fixed(r.nox, 3) },
    Column { label: "PM (g/km)", value: |r| fixed(r.pm, 4) },
];

/// Quote a field containing a comma or double quote, doubling inner
/// quotes.
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render<R>(columns: &[Column<R>], records: &[R]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| escape_field(c.label))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        lines.push(
            columns
                .iter()
                .map(|c| escape_field(&(c.value)(record)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

/// Fuel records as a CSV blob (header row included).
pub fn fuel_csv(records: &[FuelRecord]) -> String {
    render(FUEL_COLUMNS, records)
}

/// Engine records as a CSV blob.
pub fn engine_csv(records: &[EngineRecord]) -> String {
    render(ENGINE_COLUMNS, records)
}

/// Emission records as a CSV blob.
pub fn emissions_csv(records: &[EmissionRecord]) -> String {
    render(EMISSION_COLUMNS, records)
}

/// Download filename: `{kind}_data[_{make}_{model}]_{date}.csv`.
pub fn csv_filename(kind: RecordKind, vehicle: Option<&Vehicle>, today: NaiveDate) -> String {
    let vehicle_part = vehicle
        .map(|v| format!("_{}_{}", v.make, v.model))
        .unwrap_or_default();
    format!("{}_data{}_{}.csv", kind.tag(), vehicle_part, today.format("%Y-%m-%d"))
}

/// Write a CSV blob to disk.
pub fn save_csv<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_row_count_matches_input() {
        let records = demo::fuel_seed();
        let csv = fuel_csv(&records);
        assert_eq!(csv.lines().count(), records.len() + 1);
    }

    #[test]
    fn test_fuel_precision_and_header() {
        let records = demo::fuel_seed();
        let csv = fuel_csv(&records[..1]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Vehicle ID,Fuel Amount (gal),Distance (mi),MPG,Cost ($)"
        );
        assert_eq!(lines.next().unwrap(), "2023-01-15,demo-1,12.5,350.0,28.0,45.50");
    }

    #[test]
    fn test_emissions_precision() {
        let records = demo::emission_seed();
        let csv = emissions_csv(&records[..1]);
        let row = csv.lines().nth(1).unwrap();
        // NOx at 3 decimals, PM at 4.
        assert!(row.ends_with("120.5,0.080,0.0050"));
    }

    #[test]
    fn test_engine_rounds_rpm_to_integer() {
        let mut records = demo::engine_seed();
        records.truncate(1);
        records[0].rpm = 2500.4;
        let csv = engine_csv(&records);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",2500,"));
    }

    #[test]
    fn test_values_with_commas_are_quoted() {
        let mut record = demo::fuel_seed().remove(0);
        record.date = "Jan 15, 2023".into();
        record.vehicle_id = "say \"demo\"".into();
        let csv = fuel_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Jan 15, 2023\",\"say \"\"demo\"\"\","));
    }

    #[test]
    fn test_filename_with_and_without_vehicle() {
        let today = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert_eq!(
            csv_filename(RecordKind::Engine, None, today),
            "engine_data_2023-06-01.csv"
        );

        let vehicle = demo::demo_vehicles().remove(0);
        assert_eq!(
            csv_filename(RecordKind::Fuel, Some(&vehicle), today),
            "fuel_data_Toyota_Camry_2023-06-01.csv"
        );
    }

    #[test]
    fn test_save_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fuel.csv");
        let csv = fuel_csv(&demo::fuel_seed());
        save_csv(&path, &csv).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), csv);
    }
}
