//! Record normalization over unknown backend field naming.
//!
//! The backend has shipped records in camelCase, snake_case, and with
//! nested vehicle objects depending on version. Each canonical field is
//! resolved from an ordered candidate list, first match wins, so the three
//! record kinds share one table-driven routine instead of per-field
//! conditionals.

use serde_json::{Map, Value};

use crate::model::{EmissionRecord, EngineRecord, FuelRecord, Vehicle};

/// Per-kind normalization table: date candidates plus one candidate list
/// per canonical metric field, in priority order.
struct FieldSpec {
    date: &'static [&'static str],
    metrics: &'static [&'static [&'static str]],
}

const FUEL_SPEC: FieldSpec = FieldSpec {
    date: &["fillDate", "date", "fill_date"],
    metrics: &[
        &["fuelAmount", "amount", "fuel_amount"],
        &["distanceTraveled", "distance", "distance_traveled"],
        &["milesPerGallon", "mpg", "miles_per_gallon"],
        &["fuelCost", "cost", "fuel_cost"],
    ],
};

const ENGINE_SPEC: FieldSpec = FieldSpec {
    date: &["recordingTime", "date", "record_date"],
    metrics: &[
        &["engineTemperature", "temperature", "engine_temperature"],
        &["engineRpm", "rpm", "engine_rpm"],
        &["idlingTimeSeconds", "idlingTime", "idling_time_seconds"],
    ],
};

const EMISSION_SPEC: FieldSpec = FieldSpec {
    date: &["recordingTime", "date", "record_date"],
    metrics: &[
        &["co2Emissions", "co2", "co2_emissions"],
        &["noxEmissions", "nox", "nox_emissions"],
        &["particulateMatter", "pm", "particulate_matter"],
    ],
};

/// Kind-independent canonical row produced by the shared routine.
struct Canonical {
    id: String,
    vehicle_id: String,
    date: String,
    metrics: Vec<f64>,
}

/// Render a scalar JSON value as an id string. Objects, arrays, and null
/// yield `None`.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value to f64, accepting numbers and numeric strings.
fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn pick_string(obj: &Map<String, Value>, candidates: &[&str]) -> String {
    candidates
        .iter()
        .find_map(|key| obj.get(*key).and_then(scalar_string))
        .unwrap_or_default()
}

/// Missing or non-numeric metrics come back as NaN and fail the validity
/// check downstream; normalization itself never errors.
fn pick_number(obj: &Map<String, Value>, candidates: &[&str]) -> f64 {
    candidates
        .iter()
        .find_map(|key| obj.get(*key).and_then(scalar_number))
        .unwrap_or(f64::NAN)
}

/// Resolution order: direct `vehicleId`, then nested `vehicle.id`, then
/// snake_case `vehicle_id`.
fn resolve_vehicle_id(obj: &Map<String, Value>) -> String {
    if let Some(id) = obj.get("vehicleId").and_then(scalar_string) {
        return id;
    }
    if let Some(Value::Object(vehicle)) = obj.get("vehicle") {
        if let Some(id) = vehicle.get("id").and_then(scalar_string) {
            return id;
        }
    }
    obj.get("vehicle_id")
        .and_then(scalar_string)
        .unwrap_or_default()
}

/// Treat a raw payload as a list of objects: arrays pass through, a single
/// object becomes a one-element list, anything else is empty.
fn as_objects(raw: &Value) -> Vec<&Map<String, Value>> {
    match raw {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(obj) => vec![obj],
        _ => Vec::new(),
    }
}

fn normalize_with(raw: &Value, spec: &FieldSpec) -> Vec<Canonical> {
    as_objects(raw)
        .into_iter()
        .map(|obj| Canonical {
            id: obj.get("id").and_then(scalar_string).unwrap_or_default(),
            vehicle_id: resolve_vehicle_id(obj),
            date: pick_string(obj, spec.date),
            metrics: spec
                .metrics
                .iter()
                .map(|candidates| pick_number(obj, candidates))
                .collect(),
        })
        .collect()
}

/// Normalize raw fuel records. Accepts a single object or an array; always
/// returns a list, tagged `is_demo = false`.
pub fn normalize_fuel(raw: &Value) -> Vec<FuelRecord> {
    normalize_with(raw, &FUEL_SPEC)
        .into_iter()
        .map(|c| FuelRecord {
            id: c.id,
            vehicle_id: c.vehicle_id,
            date: c.date,
            amount: c.metrics[0],
            distance: c.metrics[1],
            mpg: c.metrics[2],
            cost: c.metrics[3],
            is_demo: false,
        })
        .collect()
}

/// Normalize raw engine records.
pub fn normalize_engine(raw: &Value) -> Vec<EngineRecord> {
    normalize_with(raw, &ENGINE_SPEC)
        .into_iter()
        .map(|c| EngineRecord {
            id: c.id,
            vehicle_id: c.vehicle_id,
            date: c.date,
            temperature: c.metrics[0],
            rpm: c.metrics[1],
            idling_time: c.metrics[2],
            is_demo: false,
        })
        .collect()
}

/// Normalize raw emission records.
pub fn normalize_emissions(raw: &Value) -> Vec<EmissionRecord> {
    normalize_with(raw, &EMISSION_SPEC)
        .into_iter()
        .map(|c| EmissionRecord {
            id: c.id,
            vehicle_id: c.vehicle_id,
            date: c.date,
            co2: c.metrics[0],
            nox: c.metrics[1],
            pm: c.metrics[2],
            is_demo: false,
        })
        .collect()
}

/// Normalize raw vehicle objects (camelCase backend shape, ids numeric or
/// string). Rows without an id are dropped; `is_demo` is forced false.
pub fn normalize_vehicles(raw: &Value) -> Vec<Vehicle> {
    as_objects(raw)
        .into_iter()
        .filter_map(|obj| {
            let id = obj.get("id").and_then(scalar_string)?;
            Some(Vehicle {
                id,
                make: pick_string(obj, &["make"]),
                model: pick_string(obj, &["model"]),
                year: pick_number(obj, &["year"]) as i32,
                license_plate: pick_string(obj, &["licensePlate", "license_plate"]),
                fuel_type: obj
                    .get("fuelType")
                    .or_else(|| obj.get("fuel_type"))
                    .and_then(scalar_string),
                engine_size: obj
                    .get("engineSize")
                    .or_else(|| obj.get("engine_size"))
                    .and_then(scalar_number),
                is_demo: false,
            })
        })
        .collect()
}
