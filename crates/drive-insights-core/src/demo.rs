//! Demo fleet data used when the backend is unreachable.
//!
//! A fixed seed of five vehicles and a deterministic record set per kind
//! keep every page usable without a working backend. Records the user adds
//! against a demo vehicle are persisted through the injected store and
//! rehydrated here on every load, appended after the seed in submission
//! order.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::model::{EmissionRecord, EngineRecord, FuelRecord, RecordKind, Vehicle};
use crate::store::KeyValueStore;

/// Number of seeded demo vehicles.
pub const DEMO_VEHICLE_COUNT: usize = 5;

fn vehicle(
    id: &str,
    make: &str,
    model: &str,
    year: i32,
    plate: &str,
    fuel_type: &str,
    engine_size: Option<f64>,
) -> Vehicle {
    Vehicle {
        id: id.into(),
        make: make.into(),
        model: model.into(),
        year,
        license_plate: plate.into(),
        fuel_type: Some(fuel_type.into()),
        engine_size,
        is_demo: true,
    }
}

/// The fixed demo vehicle seed. Ids are `demo-1`..`demo-5`; these vehicles
/// are never created, edited, or deleted through the backend.
pub fn demo_vehicles() -> Vec<Vehicle> {
    vec![
        vehicle("demo-1", "Toyota", "Camry", 2020, "DEMO-123", "Gasoline", Some(2.5)),
        vehicle("demo-2", "Honda", "Civic", 2019, "DEMO-456", "Gasoline", Some(1.5)),
        vehicle("demo-3", "Tesla", "Model 3", 2021, "EV1234", "Electric", None),
        vehicle("demo-4", "Ford", "F-150", 2018, "TRK456", "Gasoline", Some(5.0)),
        vehicle("demo-5", "Chevrolet", "Volt", 2020, "HYB789", "Hybrid", Some(1.5)),
    ]
}

fn fuel(n: u32, vehicle_id: &str, date: &str, amount: f64, distance: f64, mpg: f64, cost: f64) -> FuelRecord {
    FuelRecord {
        id: format!("demo-fuel-{n}"),
        vehicle_id: vehicle_id.into(),
        date: date.into(),
        amount,
        distance,
        mpg,
        cost,
        is_demo: true,
    }
}

/// Seeded fuel records. The Tesla has none; electric vehicles do not fill
/// up.
pub fn fuel_seed() -> Vec<FuelRecord> {
    vec![
        fuel(1, "demo-1", "2023-01-15", 12.5, 350.0, 28.0, 45.50),
        fuel(2, "demo-1", "2023-02-01", 13.2, 375.0, 28.4, 48.75),
        fuel(3, "demo-1", "2023-02-15", 12.8, 360.0, 28.1, 47.20),
        fuel(4, "demo-2", "2023-01-10", 10.5, 315.0, 30.0, 38.85),
        fuel(5, "demo-2", "2023-01-25", 11.0, 335.0, 30.5, 40.70),
        fuel(6, "demo-2", "2023-02-10", 10.8, 330.0, 30.6, 39.95),
        fuel(7, "demo-4", "2023-01-05", 18.5, 370.0, 20.0, 68.45),
        fuel(8, "demo-4", "2023-01-20", 19.0, 385.0, 20.3, 70.30),
        fuel(9, "demo-4", "2023-02-05", 18.8, 375.0, 19.9, 69.55),
        fuel(10, "demo-5", "2023-01-12", 8.5, 340.0, 40.0, 31.45),
        fuel(11, "demo-5", "2023-01-28", 8.2, 330.0, 40.2, 30.35),
        fuel(12, "demo-5", "2023-02-12", 8.4, 335.0, 39.9, 31.10),
    ]
}

fn engine(n: u32, vehicle_id: &str, date: &str, temperature: f64, rpm: f64, idling: f64) -> EngineRecord {
    EngineRecord {
        id: format!("demo-engine-{n}"),
        vehicle_id: vehicle_id.into(),
        date: date.into(),
        temperature,
        rpm,
        idling_time: idling,
        is_demo: true,
    }
}

/// Seeded engine records. The Tesla rows carry zero RPM and idling.
pub fn engine_seed() -> Vec<EngineRecord> {
    vec![
        engine(1, "demo-1", "2023-02-01 08:30", 195.5, 2500.0, 120.0),
        engine(2, "demo-1", "2023-02-01 12:45", 198.0, 3000.0, 90.0),
        engine(3, "demo-1", "2023-02-01 17:15", 190.0, 1800.0, 180.0),
        engine(4, "demo-2", "2023-02-02 09:20", 192.5, 2200.0, 150.0),
        engine(5, "demo-2", "2023-02-02 13:30", 195.0, 2800.0, 110.0),
        engine(6, "demo-2", "2023-02-02 18:10", 190.5, 1900.0, 200.0),
        engine(7, "demo-3", "2023-02-03 10:15", 85.0, 0.0, 0.0),
        engine(8, "demo-3", "2023-02-03 14:25", 87.5, 0.0, 0.0),
        engine(9, "demo-3", "2023-02-03 19:05", 86.0, 0.0, 0.0),
        engine(10, "demo-4", "2023-02-04 08:45", 210.5, 2100.0, 240.0),
        engine(11, "demo-4", "2023-02-04 12:55", 215.0, 2600.0, 180.0),
        engine(12, "demo-4", "2023-02-04 17:35", 208.0, 1700.0, 300.0),
        engine(13, "demo-5", "2023-02-05 09:10", 188.5, 1800.0, 130.0),
        engine(14, "demo-5", "2023-02-05 13:20", 192.0, 2300.0, 100.0),
        engine(15, "demo-5", "2023-02-05 18:00", 186.0, 1600.0, 160.0),
    ]
}

fn emission(n: u32, vehicle_id: &str, date: &str, co2: f64, nox: f64, pm: f64) -> EmissionRecord {
    EmissionRecord {
        id: format!("demo-emission-{n}"),
        vehicle_id: vehicle_id.into(),
        date: date.into(),
        co2,
        nox,
        pm,
        is_demo: true,
    }
}

/// Seeded emission records. The Tesla rows are all-zero.
pub fn emission_seed() -> Vec<EmissionRecord> {
    vec![
        emission(1, "demo-1", "2023-02-01", 120.5, 0.08, 0.005),
        emission(2, "demo-1", "2023-02-02", 135.0, 0.09, 0.006),
        emission(3, "demo-1", "2023-02-03", 110.0, 0.07, 0.004),
        emission(4, "demo-2", "2023-02-01", 115.5, 0.07, 0.004),
        emission(5, "demo-2", "2023-02-02", 125.0, 0.08, 0.005),
        emission(6, "demo-2", "2023-02-03", 105.5, 0.06, 0.003),
        emission(7, "demo-3", "2023-02-01", 0.0, 0.0, 0.0),
        emission(8, "demo-3", "2023-02-02", 0.0, 0.0, 0.0),
        emission(9, "demo-3", "2023-02-03", 0.0, 0.0, 0.0),
        emission(10, "demo-4", "2023-02-01", 180.5, 0.25, 0.015),
        emission(11, "demo-4", "2023-02-02", 195.0, 0.28, 0.017),
        emission(12, "demo-4", "2023-02-03", 170.0, 0.23, 0.014),
        emission(13, "demo-5", "2023-02-01", 85.5, 0.05, 0.003),
        emission(14, "demo-5", "2023-02-02", 90.0, 0.06, 0.004),
        emission(15, "demo-5", "2023-02-03", 80.0, 0.04, 0.002),
    ]
}

/// Read the user-added records persisted under `key`. Missing or corrupt
/// state reads as an empty list; storage problems never break a page load.
pub fn stored_records<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Vec<T> {
    let Some(raw) = store.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(key, error = %e, "stored demo records are corrupt; ignoring");
            Vec::new()
        }
    }
}

/// Full demo fuel data set: seed first, then user-added records in append
/// order.
pub fn demo_fuel_records(store: &impl KeyValueStore) -> Vec<FuelRecord> {
    let mut records = fuel_seed();
    records.extend(stored_records(store, RecordKind::Fuel.store_key()));
    records
}

/// Full demo engine data set.
pub fn demo_engine_records(store: &impl KeyValueStore) -> Vec<EngineRecord> {
    let mut records = engine_seed();
    records.extend(stored_records(store, RecordKind::Engine.store_key()));
    records
}

/// Full demo emission data set.
pub fn demo_emission_records(store: &impl KeyValueStore) -> Vec<EmissionRecord> {
    let mut records = emission_seed();
    records.extend(stored_records(store, RecordKind::Emissions.store_key()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metric;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vehicle_seed_is_fixed() {
        let vehicles = demo_vehicles();
        assert_eq!(vehicles.len(), DEMO_VEHICLE_COUNT);
        assert_eq!(vehicles[0].id, "demo-1");
        assert_eq!(vehicles[4].id, "demo-5");
        assert!(vehicles.iter().all(|v| v.is_demo));
    }

    #[test]
    fn test_seed_records_reference_seed_vehicles() {
        let ids: Vec<String> = demo_vehicles().into_iter().map(|v| v.id).collect();
        assert!(fuel_seed().iter().all(|r| ids.contains(&r.vehicle_id)));
        assert!(engine_seed().iter().all(|r| ids.contains(&r.vehicle_id)));
        assert!(emission_seed().iter().all(|r| ids.contains(&r.vehicle_id)));
    }

    #[test]
    fn test_seed_records_are_valid() {
        assert_eq!(fuel_seed().len(), 12);
        assert_eq!(engine_seed().len(), 15);
        assert_eq!(emission_seed().len(), 15);
        assert!(fuel_seed().iter().all(Metric::is_valid));
        assert!(engine_seed().iter().all(Metric::is_valid));
        assert!(emission_seed().iter().all(Metric::is_valid));
    }

    #[test]
    fn test_stored_records_appended_after_seed() {
        let store = MemoryStore::new();
        let added = FuelRecord {
            id: "demo-1700000000000".into(),
            vehicle_id: "demo-2".into(),
            date: "2023-06-01".into(),
            amount: 10.5,
            distance: 250.0,
            mpg: 23.81,
            cost: 38.50,
            is_demo: true,
        };
        store
            .put(
                RecordKind::Fuel.store_key(),
                &serde_json::to_string(&vec![added.clone()]).unwrap(),
            )
            .unwrap();

        let records = demo_fuel_records(&store);
        assert_eq!(records.len(), fuel_seed().len() + 1);
        assert_eq!(records.last(), Some(&added));
    }

    #[test]
    fn test_corrupt_storage_is_ignored() {
        let store = MemoryStore::new();
        store.put(RecordKind::Engine.store_key(), "{broken").unwrap();
        assert_eq!(demo_engine_records(&store).len(), engine_seed().len());
    }
}
