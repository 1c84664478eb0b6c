//! Light/dark theme with a persisted explicit choice.
//!
//! Until the viewer picks a theme, the system colour-scheme preference is used
//! and followed when it changes. Once a choice is stored it wins for good.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub const STORAGE_KEY: &str = "archive-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("preference file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("preference file {path} is not a JSON object: {source}")]
    Format { path: String, #[source] source: serde_json::Error },
}

/// String key-value store for viewer preferences
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self { Self::default() }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Preferences kept as a flat JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFilePreferenceStore {
    /// Open the store; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| PreferenceError::Format {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PreferenceError::Io { path: path.display().to_string(), source }),
        };
        Ok(JsonFilePreferenceStore { path, values })
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let io_err = |source: std::io::Error| PreferenceError::Io { path: self.path.display().to_string(), source };
        let json = serde_json::to_string_pretty(&self.values).map_err(|e| io_err(e.into()))?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// File-backed store when a path is configured, otherwise an in-memory one
pub fn open_store(file: Option<&str>) -> Result<Box<dyn PreferenceStore>, PreferenceError> {
    match file {
        Some(path) => Ok(Box::new(JsonFilePreferenceStore::open(path)?)),
        None => Ok(Box::new(MemoryPreferenceStore::new())),
    }
}

/// Current theme plus where it came from
pub struct ThemeManager {
    store: Box<dyn PreferenceStore>,
    current: Theme,
}

impl ThemeManager {
    /// Stored choice if valid, otherwise the system preference (not stored)
    pub fn init(store: Box<dyn PreferenceStore>, system_prefers_dark: bool) -> Self {
        let stored = store.get(STORAGE_KEY);
        let current = match stored.as_deref().map(Theme::parse) {
            Some(Some(theme)) => theme,
            Some(None) => {
                warn!("Ignoring unknown stored theme {:?}", stored);
                Theme::from_system(system_prefers_dark)
            }
            None => Theme::from_system(system_prefers_dark),
        };
        debug!("theme initialised to {}", current.as_str());
        ThemeManager { store, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Whether an explicit choice is stored
    pub fn is_explicit(&self) -> bool {
        self.store.get(STORAGE_KEY).and_then(|v| Theme::parse(&v)).is_some()
    }

    /// Apply and remember an explicit choice
    pub fn set(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        self.current = theme;
        self.store.set(STORAGE_KEY, theme.as_str())
    }

    pub fn toggle(&mut self) -> Result<Theme, PreferenceError> {
        let next = self.current.toggled();
        self.set(next)?;
        Ok(next)
    }

    /// System colour scheme changed; only followed while nothing is stored
    pub fn system_preference_changed(&mut self, prefers_dark: bool) -> Theme {
        if !self.is_explicit() {
            self.current = Theme::from_system(prefers_dark);
        }
        self.current
    }

    /// Forget the explicit choice and go back to following the system
    pub fn reset(&mut self, system_prefers_dark: bool) -> Result<Theme, PreferenceError> {
        self.store.remove(STORAGE_KEY)?;
        self.current = Theme::from_system(system_prefers_dark);
        Ok(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_toggle() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("blue"), None);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn invalid_stored_value_falls_back_to_system() {
        let mut store = MemoryPreferenceStore::new();
        store.set(STORAGE_KEY, "sepia").unwrap();
        let mgr = ThemeManager::init(Box::new(store), true);
        assert_eq!(mgr.current(), Theme::Dark);
        assert!(!mgr.is_explicit());
    }
}
