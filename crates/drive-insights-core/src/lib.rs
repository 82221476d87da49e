//! # Drive Insights Core
//!
//! Data layer for the Drive Insights fleet dashboard.

#![warn(missing_docs)]

//!
//! This library provides:
//! - Normalization of heterogeneous backend record shapes onto canonical
//!   fuel, engine, and emission records
//! - A demo-data fallback so every page renders without a backend
//! - Per-page fetch/merge orchestration with manual and staleness-based
//!   refresh
//! - Shared filtering and aggregation for tables, charts, and summary cards
//! - Record submission with demo-store persistence and multi-shape backend
//!   retry
//! - CSV export of the filtered view
//!
//! ## Example
//!
//! ```rust,ignore
//! use drive_insights_core::prelude::*;
//!
//! let client = ApiClient::new("http://localhost:8080");
//! let mut feed: DataFeed<FileStore, FuelRecord> =
//!     DataFeed::new(client, FileStore::new("storage.json"));
//!
//! let snapshot = feed.load().await;
//! let shown = view::filter(&snapshot.records, None, DateRange::Last30, Utc::now());
//! println!("fleet MPG: {:.1}", view::fuel_summary(&shown).avg_mpg);
//! ```

pub mod api;
pub mod demo;
pub mod export;
pub mod feed;
pub mod model;
pub mod normalize;
pub mod store;
pub mod submit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{ApiClient, ApiError, ClientConfig};
    pub use crate::feed::{DataFeed, FeedSnapshot, REFRESH_INTERVAL_SECS};
    pub use crate::model::{
        EmissionRecord, EngineRecord, FuelRecord, Metric, RecordKind, Vehicle, VehicleDraft,
    };
    pub use crate::store::{FileStore, KeyValueStore, MemoryStore, Theme};
    pub use crate::submit::{
        EmissionForm, EngineForm, FuelForm, SubmitError, SubmitOutcome,
    };
    pub use crate::view::{DateRange, EmissionSummary, EngineSummary, FuelSummary};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
