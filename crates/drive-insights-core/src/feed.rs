//! Fetch-and-merge orchestration for record pages.
//!
//! Each page owns one [`DataFeed`]: demo data is computed first and cannot
//! fail, then one vehicles call and one records call run against the
//! backend. A failed call degrades that half of the live data to empty
//! rather than surfacing an error, so the page always renders.

use std::marker::PhantomData;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::warn;

use crate::api::ApiClient;
use crate::demo;
use crate::model::{EmissionRecord, EngineRecord, FuelRecord, Metric, RecordKind, Vehicle};
use crate::normalize;
use crate::store::KeyValueStore;

/// Auto-refresh interval: a page re-fetches when its last successful fetch
/// is older than this.
pub const REFRESH_INTERVAL_SECS: i64 = 30;

/// Binds a canonical record type to its kind constants, normalizer, and
/// demo data set so one feed implementation serves all three pages.
pub trait FeedRecord: Metric + Sized {
    /// The record family this type belongs to.
    const KIND: RecordKind;
    /// Normalize a raw backend payload into canonical records.
    fn normalize(raw: &Value) -> Vec<Self>;
    /// Demo seed plus user-added records from the store.
    fn demo_records(store: &impl KeyValueStore) -> Vec<Self>;
}

impl FeedRecord for FuelRecord {
    const KIND: RecordKind = RecordKind::Fuel;
    fn normalize(raw: &Value) -> Vec<Self> {
        normalize::normalize_fuel(raw)
    }
    fn demo_records(store: &impl KeyValueStore) -> Vec<Self> {
        demo::demo_fuel_records(store)
    }
}

impl FeedRecord for EngineRecord {
    const KIND: RecordKind = RecordKind::Engine;
    fn normalize(raw: &Value) -> Vec<Self> {
        normalize::normalize_engine(raw)
    }
    fn demo_records(store: &impl KeyValueStore) -> Vec<Self> {
        demo::demo_engine_records(store)
    }
}

impl FeedRecord for EmissionRecord {
    const KIND: RecordKind = RecordKind::Emissions;
    fn normalize(raw: &Value) -> Vec<Self> {
        normalize::normalize_emissions(raw)
    }
    fn demo_records(store: &impl KeyValueStore) -> Vec<Self> {
        demo::demo_emission_records(store)
    }
}

/// The working data set for one page: live data first, demo data appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot<R> {
    /// Live vehicles followed by the five demo vehicles.
    pub vehicles: Vec<Vehicle>,
    /// Live records (normalized) followed by demo records.
    pub records: Vec<R>,
    /// Wall-clock time of the last successful live fetch, if any.
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Per-page fetch/merge orchestrator.
pub struct DataFeed<S, R> {
    client: ApiClient,
    store: S,
    refresh_key: u64,
    last_fetch: Option<DateTime<Utc>>,
    _record: PhantomData<R>,
}

impl<S: KeyValueStore, R: FeedRecord> DataFeed<S, R> {
    /// Create a feed over the given client and store.
    pub fn new(client: ApiClient, store: S) -> Self {
        Self {
            client,
            store,
            refresh_key: 0,
            last_fetch: None,
            _record: PhantomData,
        }
    }

    /// The store backing demo-record persistence.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one fetch cycle and produce the merged working set.
    ///
    /// Live fetch failures are logged and degrade to demo-only data; this
    /// never fails.
    pub async fn load(&mut self) -> FeedSnapshot<R> {
        // Demo data first: pure and infallible.
        let demo_vehicles = demo::demo_vehicles();
        let demo_records = R::demo_records(&self.store);

        let mut live_ok = false;
        let live_vehicles = match self.client.vehicles().await {
            Ok(vehicles) => {
                live_ok = true;
                vehicles
            }
            Err(e) => {
                warn!(error = %e, "vehicle fetch failed; falling back to demo vehicles");
                Vec::new()
            }
        };
        let live_records = match self.client.records(R::KIND).await {
            Ok(raw) => {
                live_ok = true;
                R::normalize(&raw)
            }
            Err(e) => {
                warn!(kind = R::KIND.tag(), error = %e, "record fetch failed; falling back to demo records");
                Vec::new()
            }
        };

        if live_ok {
            self.last_fetch = Some(Utc::now());
        }

        let mut vehicles = live_vehicles;
        vehicles.extend(demo_vehicles);
        let mut records = live_records;
        records.extend(demo_records);

        FeedSnapshot {
            vehicles,
            records,
            fetched_at: self.last_fetch,
        }
    }

    /// Current refresh key. Incrementing it is the sole trigger for
    /// re-running [`DataFeed::load`].
    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Request a refresh (manual action or a "record just added"
    /// navigation signal) and return the new key.
    pub fn request_refresh(&mut self) -> u64 {
        self.refresh_key += 1;
        self.refresh_key
    }

    /// Time of the last successful live fetch, for display.
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// Whether the last successful fetch is older than the auto-refresh
    /// interval (or has never happened).
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.last_fetch {
            None => true,
            Some(at) => now.signed_duration_since(at) >= Duration::seconds(REFRESH_INTERVAL_SECS),
        }
    }

    /// Periodic staleness check: bumps the refresh key and returns true if
    /// a re-fetch is due. The caller owns the timer and clears it on page
    /// teardown.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_stale(now) {
            self.request_refresh();
            true
        } else {
            false
        }
    }
}

/// Per-vehicle fuel history for the dashboard trend chart. Falls back to
/// the static demo seed filtered to the vehicle when the backend call
/// fails.
pub async fn vehicle_fuel_history(client: &ApiClient, vehicle_id: &str) -> Vec<FuelRecord> {
    match client.vehicle_fuel_history(vehicle_id).await {
        Ok(raw) => normalize::normalize_fuel(&raw),
        Err(e) => {
            warn!(vehicle_id, error = %e, "fuel history fetch failed; using demo seed");
            demo::fuel_seed()
                .into_iter()
                .filter(|r| r.vehicle_id == vehicle_id)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn unreachable_client() -> ApiClient {
        // Nothing listens on the discard port; requests fail immediately.
        ApiClient::new("http://127.0.0.1:9")
    }

    #[test]
    fn test_refresh_key_is_monotonic() {
        let mut feed: DataFeed<MemoryStore, FuelRecord> =
            DataFeed::new(unreachable_client(), MemoryStore::new());
        assert_eq!(feed.refresh_key(), 0);
        assert_eq!(feed.request_refresh(), 1);
        assert_eq!(feed.request_refresh(), 2);
        assert_eq!(feed.refresh_key(), 2);
    }

    #[test]
    fn test_staleness_before_any_fetch() {
        let feed: DataFeed<MemoryStore, FuelRecord> =
            DataFeed::new(unreachable_client(), MemoryStore::new());
        assert!(feed.is_stale(Utc::now()));
    }

    #[test]
    fn test_tick_bumps_key_when_stale() {
        let mut feed: DataFeed<MemoryStore, EngineRecord> =
            DataFeed::new(unreachable_client(), MemoryStore::new());
        let key = feed.refresh_key();
        assert!(feed.tick(Utc::now()));
        assert_eq!(feed.refresh_key(), key + 1);
    }

    #[tokio::test]
    async fn test_load_degrades_to_demo_data() {
        let mut feed: DataFeed<MemoryStore, FuelRecord> =
            DataFeed::new(unreachable_client(), MemoryStore::new());
        let snapshot = feed.load().await;

        assert_eq!(snapshot.vehicles.len(), demo::DEMO_VEHICLE_COUNT);
        assert!(snapshot.vehicles.iter().all(|v| v.is_demo));
        assert_eq!(snapshot.records, demo::fuel_seed());
        assert_eq!(snapshot.fetched_at, None);
        assert!(feed.is_stale(Utc::now()));
    }

    #[tokio::test]
    async fn test_load_is_idempotent_over_unchanged_state() {
        let mut feed: DataFeed<MemoryStore, EmissionRecord> =
            DataFeed::new(unreachable_client(), MemoryStore::new());
        let first = feed.load().await;
        let second = feed.load().await;
        assert_eq!(first.vehicles, second.vehicles);
        assert_eq!(first.records, second.records);
    }

    #[tokio::test]
    async fn test_fuel_history_falls_back_to_seed() {
        let history = vehicle_fuel_history(&unreachable_client(), "demo-4").await;
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.vehicle_id == "demo-4"));
    }
}
