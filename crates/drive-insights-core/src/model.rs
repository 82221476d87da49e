//! Canonical data model for vehicles and metric records.
//!
//! Every record the rest of the crate touches has already been mapped onto
//! the shapes below; the backend's field-naming quirks are handled in
//! [`crate::normalize`] and never leak past it.

use serde::{Deserialize, Serialize};

/// A fleet vehicle, either backend-owned or a local demo entry.
///
/// Ids are opaque strings: backend ids are numeric and stringified on
/// ingest, demo ids look like `demo-1`. `is_demo` is the only discriminator
/// between the two populations; id shape is never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Opaque vehicle id.
    pub id: String,
    /// Manufacturer name.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// License plate text.
    pub license_plate: String,
    /// Fuel type, when known (e.g. "Gasoline", "Electric").
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Engine displacement in liters, when known.
    #[serde(default)]
    pub engine_size: Option<f64>,
    /// True for locally-seeded vehicles that are never sent to the backend.
    #[serde(default)]
    pub is_demo: bool,
}

impl Vehicle {
    /// Display label used in selectors and per-vehicle charts.
    pub fn label(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

/// Vehicle fields as entered on the create/edit forms, before the backend
/// has assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    /// Manufacturer name.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// License plate text.
    pub license_plate: String,
    /// Fuel type, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    /// Engine displacement in liters, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_size: Option<f64>,
}

/// The three metric record families served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Fuel fill-ups and efficiency.
    Fuel,
    /// Engine temperature, RPM, and idling.
    Engine,
    /// CO2, NOx, and particulate emissions.
    Emissions,
}

impl RecordKind {
    /// Backend collection endpoint for this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RecordKind::Fuel => "/api/fuel-consumption",
            RecordKind::Engine => "/api/engine-data",
            RecordKind::Emissions => "/api/emissions",
        }
    }

    /// Key under which locally-added demo records persist.
    pub fn store_key(&self) -> &'static str {
        match self {
            RecordKind::Fuel => "demoFuelRecords",
            RecordKind::Engine => "demoEngineRecords",
            RecordKind::Emissions => "demoEmissionRecords",
        }
    }

    /// Short tag used in export filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Fuel => "fuel",
            RecordKind::Engine => "engine",
            RecordKind::Emissions => "emissions",
        }
    }

    /// Id assigned to a locally-added demo record.
    ///
    /// Fuel keeps the historical bare `demo-{millis}` form; the other kinds
    /// carry their tag so ids stay unique across storage keys.
    pub fn demo_record_id(&self, unix_millis: i64) -> String {
        match self {
            RecordKind::Fuel => format!("demo-{}", unix_millis),
            RecordKind::Engine => format!("demo-engine-{}", unix_millis),
            RecordKind::Emissions => format!("demo-emission-{}", unix_millis),
        }
    }
}

/// Common view over the three record types, used by the shared
/// filter/aggregate engine.
pub trait Metric {
    /// Opaque record id (may be empty for malformed upstream rows).
    fn id(&self) -> &str;
    /// Id of the owning vehicle, compared as a string everywhere.
    fn vehicle_id(&self) -> &str;
    /// Raw date string as received or entered.
    fn date(&self) -> &str;
    /// Whether the record originated locally.
    fn is_demo(&self) -> bool;
    /// The kind's primary metric; non-finite means the field was missing.
    fn primary(&self) -> f64;

    /// Records missing a vehicle, a date, or their primary metric are
    /// excluded from display and aggregation.
    fn is_valid(&self) -> bool {
        !self.vehicle_id().is_empty() && !self.date().is_empty() && self.primary().is_finite()
    }
}

/// One fuel fill-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelRecord {
    /// Opaque record id.
    pub id: String,
    /// Owning vehicle id.
    pub vehicle_id: String,
    /// Fill date.
    pub date: String,
    /// Fuel amount in gallons.
    pub amount: f64,
    /// Distance covered since the previous fill, in miles.
    pub distance: f64,
    /// Miles per gallon for this fill.
    pub mpg: f64,
    /// Fuel cost in dollars.
    pub cost: f64,
    /// True for locally-added or seeded records.
    #[serde(default)]
    pub is_demo: bool,
}

impl Metric for FuelRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }
    fn date(&self) -> &str {
        &self.date
    }
    fn is_demo(&self) -> bool {
        self.is_demo
    }
    fn primary(&self) -> f64 {
        self.amount
    }
}

/// One engine telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRecord {
    /// Opaque record id.
    pub id: String,
    /// Owning vehicle id.
    pub vehicle_id: String,
    /// Recording date/time.
    pub date: String,
    /// Engine temperature in degrees Fahrenheit.
    pub temperature: f64,
    /// Engine speed in RPM.
    pub rpm: f64,
    /// Idling time in seconds.
    pub idling_time: f64,
    /// True for locally-added or seeded records.
    #[serde(default)]
    pub is_demo: bool,
}

impl Metric for EngineRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }
    fn date(&self) -> &str {
        &self.date
    }
    fn is_demo(&self) -> bool {
        self.is_demo
    }
    fn primary(&self) -> f64 {
        self.temperature
    }
}

/// One emissions measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionRecord {
    /// Opaque record id.
    pub id: String,
    /// Owning vehicle id.
    pub vehicle_id: String,
    /// Recording date/time.
    pub date: String,
    /// CO2 emissions in g/km.
    pub co2: f64,
    /// NOx emissions in g/km.
    pub nox: f64,
    /// Particulate matter in g/km.
    pub pm: f64,
    /// True for locally-added or seeded records.
    #[serde(default)]
    pub is_demo: bool,
}

impl Metric for EmissionRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }
    fn date(&self) -> &str {
        &self.date
    }
    fn is_demo(&self) -> bool {
        self.is_demo
    }
    fn primary(&self) -> f64 {
        self.co2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_constants() {
        assert_eq!(RecordKind::Fuel.endpoint(), "/api/fuel-consumption");
        assert_eq!(RecordKind::Engine.store_key(), "demoEngineRecords");
        assert_eq!(RecordKind::Emissions.tag(), "emissions");
    }

    #[test]
    fn test_demo_record_ids() {
        assert_eq!(RecordKind::Fuel.demo_record_id(1700000000000), "demo-1700000000000");
        assert_eq!(
            RecordKind::Engine.demo_record_id(7),
            "demo-engine-7"
        );
        assert_eq!(
            RecordKind::Emissions.demo_record_id(7),
            "demo-emission-7"
        );
    }

    #[test]
    fn test_validity_requires_primary_metric() {
        let mut record = FuelRecord {
            id: "1".into(),
            vehicle_id: "demo-1".into(),
            date: "2023-01-15".into(),
            amount: 12.5,
            distance: 350.0,
            mpg: 28.0,
            cost: 45.50,
            is_demo: false,
        };
        assert!(record.is_valid());

        record.amount = f64::NAN;
        assert!(!record.is_valid());

        record.amount = 12.5;
        record.vehicle_id.clear();
        assert!(!record.is_valid());
    }

    #[test]
    fn test_vehicle_label() {
        let vehicle = Vehicle {
            id: "demo-1".into(),
            make: "Toyota".into(),
            model: "Camry".into(),
            year: 2020,
            license_plate: "DEMO-123".into(),
            fuel_type: None,
            engine_size: None,
            is_demo: true,
        };
        assert_eq!(vehicle.label(), "Toyota Camry");
    }
}
