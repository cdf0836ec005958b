//! Snapshot of the engine's durable state
//!
//! Every slice is stored as its own JSON blob so that one corrupt slice only
//! costs that slice.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::Point;
use crate::layout::Layouts;
use crate::transform::{InteractionMode, Scale};

use super::store::KeyValueStore;

pub const LAYOUT_KEY: &str = "collageLayout";
pub const MODES_KEY: &str = "collageItemModes";
pub const SCALES_KEY: &str = "collageItemScales";
pub const PAN_OFFSETS_KEY: &str = "collagePanOffsets";
pub const SCHEMA_VERSION_KEY: &str = "collageSchemaVersion";

/// Current blob layout version
pub const SCHEMA_VERSION: u32 = 1;

const ALL_KEYS: [&str; 5] = [
    LAYOUT_KEY,
    MODES_KEY,
    SCALES_KEY,
    PAN_OFFSETS_KEY,
    SCHEMA_VERSION_KEY,
];

/// Durable state slices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedSnapshot {
    pub layouts: Option<Layouts>,
    pub modes: HashMap<String, InteractionMode>,
    pub scales: HashMap<String, Scale>,
    pub pan_offsets: HashMap<String, Point>,
}

impl PersistedSnapshot {
    fn is_empty(&self) -> bool {
        self.layouts.is_none()
            && self.modes.is_empty()
            && self.scales.is_empty()
            && self.pan_offsets.is_empty()
    }
}

/// Result of reading the store at startup
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedSnapshot {
    /// Nothing usable, behave as on first run
    Empty,
    Restored(PersistedSnapshot),
}

impl LoadedSnapshot {
    pub fn into_snapshot(self) -> Option<PersistedSnapshot> {
        match self {
            LoadedSnapshot::Empty => None,
            LoadedSnapshot::Restored(snapshot) => Some(snapshot),
        }
    }
}

/// Reads and writes snapshots through a [`KeyValueStore`]
pub struct SnapshotStore {
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").finish_non_exhaustive()
    }
}

impl SnapshotStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Write every slice. Failures are logged, never returned.
    pub fn save(&mut self, snapshot: &PersistedSnapshot) {
        self.write_json(SCHEMA_VERSION_KEY, &SCHEMA_VERSION);
        if let Some(layouts) = &snapshot.layouts {
            self.write_json(LAYOUT_KEY, layouts);
        }
        self.write_json(MODES_KEY, &snapshot.modes);
        self.write_json(SCALES_KEY, &snapshot.scales);
        self.write_json(PAN_OFFSETS_KEY, &snapshot.pan_offsets);
    }

    /// Read every slice. Never fails: unreadable data yields `Empty`.
    pub fn load(&self) -> LoadedSnapshot {
        let version = self.read_json::<u32>(SCHEMA_VERSION_KEY).unwrap_or(SCHEMA_VERSION);
        if version > SCHEMA_VERSION {
            log::warn!(
                "Stored collage state has schema version {} (supported: {}), ignoring it",
                version,
                SCHEMA_VERSION
            );
            return LoadedSnapshot::Empty;
        }

        let snapshot = PersistedSnapshot {
            layouts: self.read_json(LAYOUT_KEY),
            modes: self.read_json(MODES_KEY).unwrap_or_default(),
            scales: self.read_json(SCALES_KEY).unwrap_or_default(),
            pan_offsets: self.read_json(PAN_OFFSETS_KEY).unwrap_or_default(),
        };
        if snapshot.is_empty() {
            LoadedSnapshot::Empty
        } else {
            LoadedSnapshot::Restored(snapshot)
        }
    }

    /// Remove every slice
    pub fn clear(&mut self) {
        for key in ALL_KEYS {
            if let Err(err) = self.store.remove(key) {
                log::error!("Failed to remove '{}': {}", key, err);
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                log::error!("Failed to serialize '{}': {}", key, err);
                return;
            }
        };
        if let Err(err) = self.store.set(key, &json) {
            log::error!("Failed to persist '{}': {}", key, err);
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                log::warn!("Failed to read '{}': {}", key, err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Discarding unreadable '{}': {}", key, err);
                None
            }
        }
    }
}
