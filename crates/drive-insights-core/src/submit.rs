//! Record and vehicle submission.
//!
//! Demo-vehicle submissions persist through the injected store; real ones
//! go to the backend. Because the backend's create contract has varied
//! across deployments, real submissions try an ordered list of payload
//! shapes and stop at the first one accepted. Only the final failure is
//! surfaced, with a message derived from its HTTP status class.

use std::io;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::demo;
use crate::model::{EmissionRecord, EngineRecord, FuelRecord, RecordKind, Vehicle, VehicleDraft};
use crate::store::KeyValueStore;
use crate::view;

/// Submission failures, with user-facing messages via `Display`.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// A required form field is missing; nothing was sent anywhere.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the data (400).
    #[error("Invalid data: {0}")]
    Rejected(String),

    /// The backend refused the request (401/403).
    #[error("You are not authorized to perform this action")]
    Unauthorized,

    /// Any other backend error status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// No usable response was received.
    #[error("No response from server. Please check your network connection and try again.")]
    Network,

    /// The local demo store could not be written.
    #[error("Failed to save demo record: {0}")]
    Storage(#[from] io::Error),
}

/// Successful submission: the record list page refreshes and preselects
/// the originating vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Vehicle the record was added for.
    pub vehicle_id: String,
    /// Signal for the list page's feed to force a refresh.
    pub record_added: bool,
}

impl SubmitOutcome {
    fn added(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            record_added: true,
        }
    }
}

/// Map the final error of the shape-retry loop onto the surfaced variant.
fn map_api_error(err: ApiError) -> SubmitError {
    match err {
        ApiError::Status {
            status: 400,
            message,
        } => {
            let message = if message.is_empty() {
                "Please check your input".to_string()
            } else {
                message
            };
            SubmitError::Rejected(message)
        }
        ApiError::Status {
            status: 401 | 403, ..
        } => SubmitError::Unauthorized,
        ApiError::Status { status, message } => SubmitError::Server { status, message },
        ApiError::Transport(_) | ApiError::InvalidBody(_) => SubmitError::Network,
    }
}

/// Vehicle id as a JSON value: numeric when the backend assigned a number,
/// otherwise the string as-is.
fn vehicle_id_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(id),
    }
}

/// Render a form date as RFC 3339 for payload shapes that want a full
/// timestamp; unparseable input passes through untouched.
fn iso_datetime(raw: &str) -> String {
    match view::parse_date(raw) {
        Some(dt) => dt.to_rfc3339(),
        None => raw.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Append one record to the kind's demo list in the store
/// (read-modify-write, tolerant of corrupt existing state).
fn append_stored<T: Serialize>(
    store: &impl KeyValueStore,
    kind: RecordKind,
    record: &T,
) -> Result<(), SubmitError> {
    let key = kind.store_key();
    let mut records: Vec<Value> = demo::stored_records(store, key);
    let value = serde_json::to_value(record)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    records.push(value);
    let raw =
        serde_json::to_string(&records).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    store.put(key, &raw)?;
    Ok(())
}

/// Try each candidate payload in order; first acceptance wins,
/// intermediate rejections are logged and swallowed.
async fn post_with_fallbacks(
    client: &ApiClient,
    kind: RecordKind,
    payloads: &[Value],
) -> Result<(), SubmitError> {
    let mut last_err = None;
    for payload in payloads {
        debug!(kind = kind.tag(), "trying record payload shape");
        match client.create_record(kind, payload).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(kind = kind.tag(), error = %e, "payload shape rejected");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(err) => Err(map_api_error(err)),
        None => Err(SubmitError::Network),
    }
}

/// Fuel record form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuelForm {
    /// Selected vehicle id.
    pub vehicle_id: String,
    /// Fill date, `YYYY-MM-DD`.
    pub fill_date: String,
    /// Fuel amount in gallons.
    pub fuel_amount: Option<f64>,
    /// Distance traveled in miles.
    pub distance_traveled: Option<f64>,
    /// Fuel cost in dollars (optional).
    pub fuel_cost: Option<f64>,
}

impl FuelForm {
    /// MPG is derived, never entered: distance over amount, rounded to two
    /// decimals. `None` until both inputs are positive.
    pub fn miles_per_gallon(&self) -> Option<f64> {
        match (self.fuel_amount, self.distance_traveled) {
            (Some(amount), Some(distance)) if amount > 0.0 && distance > 0.0 => {
                Some(round2(distance / amount))
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), SubmitError> {
        if self.vehicle_id.is_empty()
            || self.fill_date.is_empty()
            || self.fuel_amount.is_none()
            || self.distance_traveled.is_none()
        {
            return Err(SubmitError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate backend payload shapes, in the order they are attempted.
    fn payloads(&self) -> Vec<Value> {
        let amount = self.fuel_amount.unwrap_or(0.0);
        let distance = self.distance_traveled.unwrap_or(0.0);
        let mpg = self.miles_per_gallon().unwrap_or(0.0);
        let cost = self.fuel_cost.unwrap_or(0.0);
        let id = vehicle_id_value(&self.vehicle_id);
        vec![
            // Spring-style nested vehicle reference.
            json!({
                "vehicle": { "id": id },
                "fuelAmount": amount,
                "distanceTraveled": distance,
                "milesPerGallon": mpg,
                "fuelCost": cost,
                "fillDate": self.fill_date,
            }),
            // snake_case fields.
            json!({
                "vehicle_id": id,
                "fuel_amount": amount,
                "distance_traveled": distance,
                "miles_per_gallon": mpg,
                "fuel_cost": cost,
                "fill_date": self.fill_date,
            }),
            // Flat camelCase.
            json!({
                "vehicleId": id,
                "fuelAmount": amount,
                "distanceTraveled": distance,
                "milesPerGallon": mpg,
                "fuelCost": cost,
                "fillDate": self.fill_date,
            }),
            // Flat camelCase with a full RFC 3339 timestamp.
            json!({
                "vehicleId": id,
                "fuelAmount": amount,
                "distanceTraveled": distance,
                "milesPerGallon": mpg,
                "fuelCost": cost,
                "fillDate": iso_datetime(&self.fill_date),
            }),
        ]
    }
}

/// Submit a fuel record for the given vehicle.
pub async fn submit_fuel(
    client: &ApiClient,
    store: &impl KeyValueStore,
    vehicle: &Vehicle,
    form: &FuelForm,
) -> Result<SubmitOutcome, SubmitError> {
    form.validate()?;

    if vehicle.is_demo {
        let record = FuelRecord {
            id: RecordKind::Fuel.demo_record_id(chrono::Utc::now().timestamp_millis()),
            vehicle_id: form.vehicle_id.clone(),
            date: form.fill_date.clone(),
            amount: form.fuel_amount.unwrap_or(0.0),
            distance: form.distance_traveled.unwrap_or(0.0),
            mpg: form.miles_per_gallon().unwrap_or(0.0),
            cost: form.fuel_cost.unwrap_or(0.0),
            is_demo: true,
        };
        append_stored(store, RecordKind::Fuel, &record)?;
        return Ok(SubmitOutcome::added(&form.vehicle_id));
    }

    post_with_fallbacks(client, RecordKind::Fuel, &form.payloads()).await?;
    Ok(SubmitOutcome::added(&form.vehicle_id))
}

/// Engine record form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineForm {
    /// Selected vehicle id.
    pub vehicle_id: String,
    /// Recording date, `YYYY-MM-DD`.
    pub date: String,
    /// Engine temperature in degrees Fahrenheit.
    pub temperature: Option<f64>,
    /// Engine speed in RPM.
    pub rpm: Option<f64>,
    /// Idling time in seconds (optional).
    pub idling_time: Option<f64>,
}

impl EngineForm {
    fn validate(&self) -> Result<(), SubmitError> {
        if self.vehicle_id.is_empty()
            || self.date.is_empty()
            || self.temperature.is_none()
            || self.rpm.is_none()
        {
            return Err(SubmitError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        Ok(())
    }

    fn payloads(&self) -> Vec<Value> {
        let temperature = self.temperature.unwrap_or(0.0);
        let rpm = self.rpm.unwrap_or(0.0).round() as i64;
        let idling = self.idling_time.unwrap_or(0.0).round() as i64;
        let id = vehicle_id_value(&self.vehicle_id);
        vec![
            // Backend DTO shape.
            json!({
                "vehicleId": id,
                "engineTemperature": temperature,
                "engineRpm": rpm,
                "idlingTimeSeconds": idling,
                "recordingTime": iso_datetime(&self.date),
            }),
            // snake_case fallback.
            json!({
                "vehicle_id": id,
                "engine_temperature": temperature,
                "engine_rpm": rpm,
                "idling_time_seconds": idling,
                "recording_time": iso_datetime(&self.date),
            }),
        ]
    }
}

/// Submit an engine record for the given vehicle.
pub async fn submit_engine(
    client: &ApiClient,
    store: &impl KeyValueStore,
    vehicle: &Vehicle,
    form: &EngineForm,
) -> Result<SubmitOutcome, SubmitError> {
    form.validate()?;

    if vehicle.is_demo {
        let record = EngineRecord {
            id: RecordKind::Engine.demo_record_id(chrono::Utc::now().timestamp_millis()),
            vehicle_id: form.vehicle_id.clone(),
            date: form.date.clone(),
            temperature: form.temperature.unwrap_or(0.0),
            rpm: form.rpm.unwrap_or(0.0),
            idling_time: form.idling_time.unwrap_or(0.0),
            is_demo: true,
        };
        append_stored(store, RecordKind::Engine, &record)?;
        return Ok(SubmitOutcome::added(&form.vehicle_id));
    }

    post_with_fallbacks(client, RecordKind::Engine, &form.payloads()).await?;
    Ok(SubmitOutcome::added(&form.vehicle_id))
}

/// Emission record form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionForm {
    /// Selected vehicle id.
    pub vehicle_id: String,
    /// Recording date, `YYYY-MM-DD`.
    pub date: String,
    /// CO2 emissions in g/km.
    pub co2: Option<f64>,
    /// NOx emissions in g/km (optional).
    pub nox: Option<f64>,
    /// Particulate matter in g/km (optional).
    pub pm: Option<f64>,
}

impl EmissionForm {
    fn validate(&self) -> Result<(), SubmitError> {
        if self.vehicle_id.is_empty() || self.date.is_empty() || self.co2.is_none() {
            return Err(SubmitError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        Ok(())
    }

    fn payloads(&self) -> Vec<Value> {
        let co2 = self.co2.unwrap_or(0.0);
        let nox = self.nox.unwrap_or(0.0);
        let pm = self.pm.unwrap_or(0.0);
        let id = vehicle_id_value(&self.vehicle_id);
        vec![
            // Backend DTO shape.
            json!({
                "vehicleId": id,
                "co2Emissions": co2,
                "noxEmissions": nox,
                "particulateMatter": pm,
                "recordingTime": iso_datetime(&self.date),
            }),
            // snake_case fallback.
            json!({
                "vehicle_id": id,
                "co2_emissions": co2,
                "nox_emissions": nox,
                "particulate_matter": pm,
                "recording_time": iso_datetime(&self.date),
            }),
        ]
    }
}

/// Submit an emission record for the given vehicle.
pub async fn submit_emission(
    client: &ApiClient,
    store: &impl KeyValueStore,
    vehicle: &Vehicle,
    form: &EmissionForm,
) -> Result<SubmitOutcome, SubmitError> {
    form.validate()?;

    if vehicle.is_demo {
        let record = EmissionRecord {
            id: RecordKind::Emissions.demo_record_id(chrono::Utc::now().timestamp_millis()),
            vehicle_id: form.vehicle_id.clone(),
            date: form.date.clone(),
            co2: form.co2.unwrap_or(0.0),
            nox: form.nox.unwrap_or(0.0),
            pm: form.pm.unwrap_or(0.0),
            is_demo: true,
        };
        append_stored(store, RecordKind::Emissions, &record)?;
        return Ok(SubmitOutcome::added(&form.vehicle_id));
    }

    post_with_fallbacks(client, RecordKind::Emissions, &form.payloads()).await?;
    Ok(SubmitOutcome::added(&form.vehicle_id))
}

/// Validate a vehicle draft from the create/edit form.
pub fn validate_vehicle(draft: &VehicleDraft) -> Result<(), SubmitError> {
    if draft.make.is_empty() || draft.model.is_empty() || draft.license_plate.is_empty() {
        return Err(SubmitError::Validation(
            "Please fill in all required fields.".to_string(),
        ));
    }
    if draft.year < 1900 {
        return Err(SubmitError::Validation(
            "Please enter a valid model year.".to_string(),
        ));
    }
    Ok(())
}

/// Create a vehicle, or update it when `existing_id` is given. Demo
/// vehicles never reach this path; the list page disables their actions.
pub async fn submit_vehicle(
    client: &ApiClient,
    existing_id: Option<&str>,
    draft: &VehicleDraft,
) -> Result<(), SubmitError> {
    validate_vehicle(draft)?;
    let result = match existing_id {
        Some(id) => client.update_vehicle(id, draft).await,
        None => client.create_vehicle(draft).await.map(|_| ()),
    };
    result.map_err(map_api_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fuel_form() -> FuelForm {
        FuelForm {
            vehicle_id: "demo-1".into(),
            fill_date: "2023-06-01".into(),
            fuel_amount: Some(10.5),
            distance_traveled: Some(250.0),
            fuel_cost: Some(38.50),
        }
    }

    #[test]
    fn test_mpg_is_derived_and_rounded() {
        assert_eq!(fuel_form().miles_per_gallon(), Some(23.81));

        let mut form = fuel_form();
        form.fuel_amount = Some(0.0);
        assert_eq!(form.miles_per_gallon(), None);
    }

    #[test]
    fn test_validation_rejects_missing_fields() {
        let mut form = fuel_form();
        form.distance_traveled = None;
        assert!(matches!(form.validate(), Err(SubmitError::Validation(_))));

        let mut form = EngineForm::default();
        assert!(matches!(form.validate(), Err(SubmitError::Validation(_))));
        form.vehicle_id = "1".into();
        form.date = "2023-06-01".into();
        form.temperature = Some(195.0);
        form.rpm = Some(2500.0);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_fuel_payload_shapes_in_order() {
        let payloads = fuel_form().payloads();
        assert_eq!(payloads.len(), 4);
        // Shape 1: nested vehicle reference.
        assert_eq!(payloads[0]["vehicle"]["id"], serde_json::json!("demo-1"));
        assert_eq!(payloads[0]["fillDate"], serde_json::json!("2023-06-01"));
        // Shape 2: snake_case.
        assert_eq!(payloads[1]["fuel_amount"], serde_json::json!(10.5));
        // Shape 3: flat camelCase.
        assert_eq!(payloads[2]["vehicleId"], serde_json::json!("demo-1"));
        // Shape 4: RFC 3339 date.
        assert!(payloads[3]["fillDate"]
            .as_str()
            .unwrap()
            .starts_with("2023-06-01T00:00:00"));
        // Derived MPG is carried in every shape.
        assert_eq!(payloads[0]["milesPerGallon"], serde_json::json!(23.81));
    }

    #[test]
    fn test_numeric_vehicle_ids_sent_as_numbers() {
        let mut form = fuel_form();
        form.vehicle_id = "42".into();
        let payloads = form.payloads();
        assert_eq!(payloads[0]["vehicle"]["id"], serde_json::json!(42));
    }

    #[test]
    fn test_error_message_selection_by_status() {
        let rejected = map_api_error(ApiError::Status {
            status: 400,
            message: "fillDate is required".into(),
        });
        assert_eq!(rejected.to_string(), "Invalid data: fillDate is required");

        let rejected = map_api_error(ApiError::Status {
            status: 400,
            message: String::new(),
        });
        assert_eq!(rejected.to_string(), "Invalid data: Please check your input");

        let unauthorized = map_api_error(ApiError::Status {
            status: 403,
            message: "nope".into(),
        });
        assert!(matches!(unauthorized, SubmitError::Unauthorized));

        let server = map_api_error(ApiError::Status {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(server.to_string(), "Server error (500): boom");

        let network = map_api_error(ApiError::InvalidBody("garbled".into()));
        assert!(matches!(network, SubmitError::Network));
    }

    #[test]
    fn test_vehicle_draft_validation() {
        let draft = VehicleDraft {
            make: "Toyota".into(),
            model: "Camry".into(),
            year: 2020,
            license_plate: "ABC123".into(),
            fuel_type: Some("Gasoline".into()),
            engine_size: Some(2.5),
        };
        assert!(validate_vehicle(&draft).is_ok());

        let mut missing = draft.clone();
        missing.make.clear();
        assert!(matches!(
            validate_vehicle(&missing),
            Err(SubmitError::Validation(_))
        ));

        let mut bad_year = draft;
        bad_year.year = 0;
        assert!(matches!(
            validate_vehicle(&bad_year),
            Err(SubmitError::Validation(_))
        ));
    }
}
