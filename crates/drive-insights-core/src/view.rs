//! Filtering and aggregation over the merged record set.
//!
//! Pure and synchronous: the page hands in its merged records plus the two
//! filter controls and gets back the displayed view. One canonical
//! aggregate definition exists per metric; pages never reimplement these.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::model::{EmissionRecord, EngineRecord, FuelRecord, Metric, Vehicle};

/// Date-range filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    /// No date filtering.
    #[default]
    All,
    /// Records from the last 7 days.
    Last7,
    /// Records from the last 30 days.
    Last30,
    /// Records from the last 90 days.
    Last90,
}

impl DateRange {
    /// Cutoff instant for this range, or `None` for [`DateRange::All`].
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            DateRange::All => return None,
            DateRange::Last7 => 7,
            DateRange::Last30 => 30,
            DateRange::Last90 => 90,
        };
        Some(now - Duration::days(days))
    }
}

/// Lenient parse of the date strings the backend and forms produce:
/// RFC 3339, `YYYY-MM-DDTHH:MM:SS` (Spring `LocalDateTime`),
/// `YYYY-MM-DD HH:MM`, and bare `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Derive the displayed subset: invalid records dropped, then the vehicle
/// predicate (string equality; `None` or empty selects all), then the date
/// range. Records with unparseable dates are excluded only while a range
/// filter is active. Input order is preserved.
pub fn filter<R: Metric + Clone>(
    records: &[R],
    selected_vehicle: Option<&str>,
    range: DateRange,
    now: DateTime<Utc>,
) -> Vec<R> {
    let cutoff = range.cutoff(now);
    records
        .iter()
        .filter(|r| r.is_valid())
        .filter(|r| match selected_vehicle {
            Some(id) if !id.is_empty() => r.vehicle_id() == id,
            _ => true,
        })
        .filter(|r| match cutoff {
            None => true,
            Some(cutoff) => parse_date(r.date()).is_some_and(|d| d >= cutoff),
        })
        .cloned()
        .collect()
}

/// Sort ascending by parsed date for chart rendering. Stable; records with
/// unparseable dates sort first.
pub fn sort_by_date<R: Metric>(records: &mut [R]) {
    records.sort_by_key(|r| parse_date(r.date()));
}

fn sum_finite(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| v.is_finite()).sum()
}

fn mean_finite(values: impl Iterator<Item = f64>) -> f64 {
    let (count, total) = values
        .filter(|v| v.is_finite())
        .fold((0u32, 0.0), |(count, total), v| (count + 1, total + v));
    if count > 0 {
        total / f64::from(count)
    } else {
        0.0
    }
}

/// Fleet fuel totals for the summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FuelSummary {
    /// Total distance in miles.
    pub total_distance: f64,
    /// Total fuel in gallons.
    pub total_fuel: f64,
    /// Total cost in dollars.
    pub total_cost: f64,
    /// Fleet MPG: total distance over total fuel, not a mean of per-record
    /// MPG. Zero when no fuel.
    pub avg_mpg: f64,
}

/// Compute the fuel summary over an already-filtered set.
pub fn fuel_summary(records: &[FuelRecord]) -> FuelSummary {
    let total_distance = sum_finite(records.iter().map(|r| r.distance));
    let total_fuel = sum_finite(records.iter().map(|r| r.amount));
    let total_cost = sum_finite(records.iter().map(|r| r.cost));
    let avg_mpg = if total_fuel > 0.0 {
        total_distance / total_fuel
    } else {
        0.0
    };
    FuelSummary {
        total_distance,
        total_fuel,
        total_cost,
        avg_mpg,
    }
}

/// Engine summary for the monitoring page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSummary {
    /// Mean engine temperature in degrees Fahrenheit.
    pub avg_temperature: f64,
    /// Mean RPM.
    pub avg_rpm: f64,
    /// Total idling time in seconds.
    pub total_idling_time: f64,
}

/// Compute the engine summary over an already-filtered set.
pub fn engine_summary(records: &[EngineRecord]) -> EngineSummary {
    EngineSummary {
        avg_temperature: mean_finite(records.iter().map(|r| r.temperature)),
        avg_rpm: mean_finite(records.iter().map(|r| r.rpm)),
        total_idling_time: sum_finite(records.iter().map(|r| r.idling_time)),
    }
}

/// Emission summary for the emissions page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmissionSummary {
    /// Mean CO2 in g/km.
    pub avg_co2: f64,
    /// Mean NOx in g/km.
    pub avg_nox: f64,
    /// Mean particulate matter in g/km.
    pub avg_pm: f64,
}

/// Compute the emission summary over an already-filtered set.
pub fn emission_summary(records: &[EmissionRecord]) -> EmissionSummary {
    EmissionSummary {
        avg_co2: mean_finite(records.iter().map(|r| r.co2)),
        avg_nox: mean_finite(records.iter().map(|r| r.nox)),
        avg_pm: mean_finite(records.iter().map(|r| r.pm)),
    }
}

/// One slice of a per-vehicle chart.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleAggregate {
    /// Vehicle id the slice belongs to.
    pub vehicle_id: String,
    /// Chart label, `"{make} {model}"`.
    pub label: String,
    /// Aggregated value.
    pub value: f64,
}

fn by_vehicle<R, F>(vehicles: &[Vehicle], records: &[R], aggregate: F) -> Vec<VehicleAggregate>
where
    R: Metric,
    F: Fn(&[&R]) -> f64,
{
    vehicles
        .iter()
        .map(|vehicle| {
            let owned: Vec<&R> = records
                .iter()
                .filter(|r| r.vehicle_id() == vehicle.id)
                .collect();
            VehicleAggregate {
                vehicle_id: vehicle.id.clone(),
                label: vehicle.label(),
                value: aggregate(&owned),
            }
        })
        // All-zero groups clutter the chart (the table still shows them).
        .filter(|group| group.value != 0.0)
        .collect()
}

/// Total idling time per vehicle, zero groups dropped.
pub fn idling_by_vehicle(
    vehicles: &[Vehicle],
    records: &[EngineRecord],
) -> Vec<VehicleAggregate> {
    by_vehicle(vehicles, records, |owned| {
        sum_finite(owned.iter().map(|r| r.idling_time))
    })
}

/// Mean CO2 per vehicle, zero groups dropped.
pub fn co2_by_vehicle(
    vehicles: &[Vehicle],
    records: &[EmissionRecord],
) -> Vec<VehicleAggregate> {
    by_vehicle(vehicles, records, |owned| {
        mean_finite(owned.iter().map(|r| r.co2))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_filtered_is_subset_and_satisfies_predicates() {
        let records = demo::fuel_seed();
        let filtered = filter(&records, Some("demo-2"), DateRange::Last90, now());

        assert!(filtered.len() <= records.len());
        for record in &filtered {
            assert!(records.contains(record));
            assert_eq!(record.vehicle_id, "demo-2");
            assert!(parse_date(&record.date).unwrap() >= now() - Duration::days(90));
        }
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_empty_selection_passes_all_vehicles() {
        let records = demo::fuel_seed();
        assert_eq!(
            filter(&records, Some(""), DateRange::All, now()).len(),
            records.len()
        );
        assert_eq!(
            filter(&records, None, DateRange::All, now()).len(),
            records.len()
        );
    }

    #[test]
    fn test_last7_with_only_old_records_is_empty_with_zero_summary() {
        let records = demo::fuel_seed(); // all dated Jan/Feb 2023
        let filtered = filter(&records, None, DateRange::Last7, now());
        assert!(filtered.is_empty());

        let summary = fuel_summary(&filtered);
        assert_eq!(summary, FuelSummary::default());
    }

    #[test]
    fn test_unparseable_dates_excluded_only_under_range_filter() {
        let mut record = demo::fuel_seed().remove(0);
        record.date = "yesterday-ish".into();
        let records = vec![record];

        assert_eq!(filter(&records, None, DateRange::All, now()).len(), 1);
        assert!(filter(&records, None, DateRange::Last90, now()).is_empty());
    }

    #[test]
    fn test_invalid_records_dropped_before_filtering() {
        let mut records = demo::fuel_seed();
        records[0].amount = f64::NAN;
        records[1].vehicle_id.clear();
        let filtered = filter(&records, None, DateRange::All, now());
        assert_eq!(filtered.len(), records.len() - 2);
    }

    #[test]
    fn test_fleet_mpg_is_ratio_of_totals() {
        let records = demo::fuel_seed();
        let summary = fuel_summary(&records);
        let expected = summary.total_distance / summary.total_fuel;
        assert!((summary.avg_mpg - expected).abs() < 1e-9);
        // Not the mean of per-record MPG.
        let naive_mean = mean_finite(records.iter().map(|r| r.mpg));
        assert!((summary.avg_mpg - naive_mean).abs() > 1e-3);
    }

    #[test]
    fn test_engine_summary_means_and_total() {
        let records = demo::engine_seed();
        let summary = engine_summary(&records);
        assert!((summary.avg_temperature - 174.7).abs() < 0.1);
        assert_eq!(summary.total_idling_time, 1960.0);
    }

    #[test]
    fn test_summary_skips_non_finite_values() {
        let mut records = demo::emission_seed();
        records[0].nox = f64::NAN;
        let summary = emission_summary(&records);
        assert!(summary.avg_nox.is_finite());
    }

    #[test]
    fn test_zero_groups_dropped_from_charts() {
        let vehicles = demo::demo_vehicles();
        let idling = idling_by_vehicle(&vehicles, &demo::engine_seed());
        // The Tesla idles for zero seconds and is dropped.
        assert_eq!(idling.len(), 4);
        assert!(idling.iter().all(|g| g.vehicle_id != "demo-3"));

        let co2 = co2_by_vehicle(&vehicles, &demo::emission_seed());
        assert_eq!(co2.len(), 4);
    }

    #[test]
    fn test_sort_by_date_ascending() {
        let mut records = demo::fuel_seed();
        sort_by_date(&mut records);
        let dates: Vec<_> = records.iter().map(|r| parse_date(&r.date).unwrap()).collect();
        assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2023-02-01").is_some());
        assert!(parse_date("2023-02-01 08:30").is_some());
        assert!(parse_date("2023-02-01T08:30:00").is_some());
        assert!(parse_date("2023-02-01T08:30:00Z").is_some());
        assert!(parse_date("02/01/2023").is_none());
    }
}
