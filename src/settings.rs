//! Player preferences
//!
//! Only two things persist between sessions: the mute flag and the graphics
//! mode. Both are stored as plain strings in a key-value store (LocalStorage
//! in the browser, an in-memory map elsewhere).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::consts::DEFAULT_VERTICAL_RESOLUTION;

pub const MUTE_KEY: &str = "grav-flip-mute";
pub const GRAPHICS_KEY: &str = "grav-flip-graphics";

/// Rendering detail level, cycled by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GraphicsMode {
    #[default]
    Fancy,
    Normal,
    Basic,
}

impl GraphicsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphicsMode::Fancy => "Fancy",
            GraphicsMode::Normal => "Normal",
            GraphicsMode::Basic => "Basic",
        }
    }

    /// Stored form: "0", "1" or "2"
    pub fn index(&self) -> u8 {
        match self {
            GraphicsMode::Fancy => 0,
            GraphicsMode::Normal => 1,
            GraphicsMode::Basic => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(GraphicsMode::Fancy),
            1 => Some(GraphicsMode::Normal),
            2 => Some(GraphicsMode::Basic),
            _ => None,
        }
    }

    /// Next mode in the cycle, wrapping around
    pub fn next(&self) -> Self {
        match self {
            GraphicsMode::Fancy => GraphicsMode::Normal,
            GraphicsMode::Normal => GraphicsMode::Basic,
            GraphicsMode::Basic => GraphicsMode::Fancy,
        }
    }

    /// Background stars drawn
    pub fn star_count(&self) -> usize {
        match self {
            GraphicsMode::Fancy => 300,
            GraphicsMode::Normal => 150,
            GraphicsMode::Basic => 50,
        }
    }

    /// Fraction of decorative lines drawn (plasma glow, meteorite shading)
    pub fn line_density(&self) -> f32 {
        match self {
            GraphicsMode::Fancy => 1.0,
            GraphicsMode::Normal => 0.5,
            GraphicsMode::Basic => 0.2,
        }
    }

    /// Canvas height in pixels
    pub fn vertical_resolution(&self) -> u32 {
        match self {
            GraphicsMode::Fancy => 800,
            GraphicsMode::Normal => DEFAULT_VERTICAL_RESOLUTION,
            GraphicsMode::Basic => 400,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("failed to read key {key}")]
    Read { key: String },
    #[error("failed to write key {key}")]
    Write { key: String },
}

/// String key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Non-persistent store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - settings will not persist");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.get_item(key).map_err(|_| StorageError::Read {
            key: key.to_string(),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        storage.set_item(key, value).map_err(|_| StorageError::Write {
            key: key.to_string(),
        })
    }
}

/// Persisted player preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub muted: bool,
    pub graphics: GraphicsMode,
}

impl Settings {
    /// Read settings, falling back to defaults for anything missing or bad
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let muted = match store.get(MUTE_KEY) {
            Ok(value) => value.is_some_and(|v| !v.is_empty()),
            Err(e) => {
                log::warn!("Could not read mute setting: {e}");
                false
            }
        };

        let graphics = match store.get(GRAPHICS_KEY) {
            Ok(Some(value)) => value
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(GraphicsMode::from_index)
                .unwrap_or_else(|| {
                    log::warn!("Ignoring unknown graphics mode {value:?}");
                    GraphicsMode::default()
                }),
            Ok(None) => GraphicsMode::default(),
            Err(e) => {
                log::warn!("Could not read graphics setting: {e}");
                GraphicsMode::default()
            }
        };

        Self { muted, graphics }
    }

    /// Flip the mute flag and persist it; the new value applies even if the
    /// write fails
    pub fn toggle_mute(&mut self, store: &mut dyn KeyValueStore) -> bool {
        self.muted = !self.muted;
        log::info!("Muted: {}", self.muted);
        if let Err(e) = store.set(MUTE_KEY, if self.muted { "y" } else { "" }) {
            log::warn!("Could not save mute setting: {e}");
        }
        self.muted
    }

    /// Advance to the next graphics mode and persist it
    pub fn cycle_graphics(&mut self, store: &mut dyn KeyValueStore) -> GraphicsMode {
        self.graphics = self.graphics.next();
        log::info!("Graphics mode: {}", self.graphics.as_str());
        if let Err(e) = store.set(GRAPHICS_KEY, &self.graphics.index().to_string()) {
            log::warn!("Could not save graphics setting: {e}");
        }
        self.graphics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose every call fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                key: key.to_string(),
            })
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let store = MemoryStore::default();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = MemoryStore::default();
        let mut settings = Settings::default();
        settings.toggle_mute(&mut store);
        settings.cycle_graphics(&mut store);
        settings.cycle_graphics(&mut store);
        assert_eq!(store.get(MUTE_KEY).ok().flatten().as_deref(), Some("y"));
        assert_eq!(store.get(GRAPHICS_KEY).ok().flatten().as_deref(), Some("2"));

        let loaded = Settings::load(&store);
        assert!(loaded.muted);
        assert_eq!(loaded.graphics, GraphicsMode::Basic);

        let mut loaded = loaded;
        loaded.toggle_mute(&mut store);
        assert!(!Settings::load(&store).muted);
    }

    #[test]
    fn test_graphics_cycle_wraps() {
        let mode = GraphicsMode::Basic.next();
        assert_eq!(mode, GraphicsMode::Fancy);
        assert!(GraphicsMode::Fancy.star_count() > GraphicsMode::Basic.star_count());
        assert_eq!(GraphicsMode::Normal.vertical_resolution(), DEFAULT_VERTICAL_RESOLUTION);
    }

    #[test]
    fn test_garbage_graphics_value_falls_back() {
        let mut store = MemoryStore::default();
        store.set(GRAPHICS_KEY, "fancy please").ok();
        assert_eq!(Settings::load(&store).graphics, GraphicsMode::Fancy);
    }

    #[test]
    fn test_broken_store_degrades() {
        let mut store = BrokenStore;
        let mut settings = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert!(settings.toggle_mute(&mut store));
        assert_eq!(settings.cycle_graphics(&mut store), GraphicsMode::Normal);
    }
}
