//! Key-value persistence for locally-added demo records and UI settings.
//!
//! The browser build backed this with local storage; here it is a small
//! trait so the demo generator and submission pipeline can be driven by an
//! in-memory fake in tests and by a JSON file on disk in the app.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tracing::warn;

/// String key-value storage. Reads never fail; corrupt state reads as
/// absent.
pub trait KeyValueStore {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> io::Result<()>;
}

/// In-memory store used in tests and for demo-only sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Disk-backed store: one JSON object file, keys as members.
///
/// The file is created on first write. A missing or corrupt file reads as
/// empty, matching the tolerance the rest of the crate expects from
/// storage.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_map(&self) -> serde_json::Map<String, Value> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return serde_json::Map::new(),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "store file is not a JSON object; treating as empty");
                serde_json::Map::new()
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), Value::String(value.to_string()));
        let serialized = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serialized)
    }
}

/// Storage key for the UI color theme.
pub const THEME_KEY: &str = "color-theme";

/// UI color theme persisted alongside the demo records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light theme (default).
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Load the persisted theme; unknown or missing values fall back to
    /// light.
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// Persist this theme.
    pub fn save(&self, store: &impl KeyValueStore) -> io::Result<()> {
        store.put(THEME_KEY, self.as_str())
    }
}
