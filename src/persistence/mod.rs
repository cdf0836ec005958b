//! Durable snapshot of layout and transform state
//!
//! This module contains:
//! - The `KeyValueStore` trait with memory and file backends
//! - Encoding of the state slices into independent JSON blobs

pub mod snapshot;
pub mod store;

pub use snapshot::{LoadedSnapshot, PersistedSnapshot, SnapshotStore};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
