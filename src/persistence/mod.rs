//! Key-value persistence
//!
//! Settings, high scores, level progress and achievements are stored as JSON
//! strings under fixed keys. The store itself is a collaborator: browser
//! LocalStorage on wasm32, an in-memory map elsewhere and in tests.

pub mod store;

pub use store::MemoryStore;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const SETTINGS_KEY: &str = "shootman-settings";
pub const HIGHSCORES_KEY: &str = "shootman-highscores";
pub const PROGRESS_KEY: &str = "shootman-progress";
pub const ACHIEVEMENTS_KEY: &str = "shootman-achievements";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation failed: {0}")]
    Storage(String),
    #[error("invalid stored data: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Read and decode a JSON value. `Ok(None)` when the key is absent.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match store.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Load a value, falling back to its default on absence or any failure
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match load_json(store, key) {
        Ok(Some(value)) => {
            log::info!("Loaded {key}");
            value
        }
        Ok(None) => {
            log::info!("No stored {key}, using defaults");
            T::default()
        }
        Err(e) => {
            log::warn!("Failed to load {key}: {e}");
            T::default()
        }
    }
}

/// Save a value, logging instead of failing
pub fn save_or_warn<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    match save_json(store, key, value) {
        Ok(()) => log::info!("Saved {key}"),
        Err(e) => log::warn!("Failed to save {key}: {e}"),
    }
}
