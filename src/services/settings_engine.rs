// TabMosaic Settings Engine
// Loads, saves, updates and resets the overview settings blob.
// Each top-level field lives under its own key in the host key-value store, so a
// missing or malformed key only costs that one field its stored value.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::platform::host::KeyValueStore;
use crate::types::errors::SettingsError;
use crate::types::settings::{OverviewSettings, WINDOW_ID_KEY};
use crate::types::tab::WindowId;
use crate::types::window::WindowBounds;

const BOUNDS_KEY: &str = "overviewBounds";

/// Trait defining the settings engine interface.
#[async_trait]
pub trait SettingsEngineTrait: Send {
    async fn load(&mut self) -> Result<OverviewSettings, SettingsError>;
    async fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &OverviewSettings;
    async fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    async fn reset(&mut self) -> Result<(), SettingsError>;
}

/// Settings engine over any [`KeyValueStore`].
pub struct SettingsEngine {
    store: Arc<dyn KeyValueStore>,
    settings: OverviewSettings,
}

impl SettingsEngine {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            settings: OverviewSettings::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn bounds(&self) -> Result<Option<WindowBounds>, SettingsError> {
        read_bounds(self.store.as_ref()).await
    }

    pub async fn set_bounds(&mut self, bounds: WindowBounds) -> Result<(), SettingsError> {
        write_bounds(self.store.as_ref(), bounds).await?;
        self.settings.overview_bounds = Some(bounds);
        Ok(())
    }

    pub async fn clear_bounds(&mut self) -> Result<(), SettingsError> {
        clear_bounds(self.store.as_ref()).await?;
        self.settings.overview_bounds = None;
        Ok(())
    }
}

fn to_object(settings: &OverviewSettings) -> Result<Map<String, Value>, SettingsError> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SettingsError::SerializationError(
            "settings did not serialize to an object".to_string(),
        )),
        Err(e) => Err(SettingsError::SerializationError(format!(
            "Failed to serialize settings: {}",
            e
        ))),
    }
}

fn from_object(map: Map<String, Value>) -> Result<OverviewSettings, serde_json::Error> {
    serde_json::from_value(Value::Object(map))
}

#[async_trait]
impl SettingsEngineTrait for SettingsEngine {
    /// Reads every key. Missing keys keep their default; malformed ones are
    /// logged and replaced with the default.
    async fn load(&mut self) -> Result<OverviewSettings, SettingsError> {
        let mut merged = to_object(&OverviewSettings::default())?;

        for key in OverviewSettings::KEYS {
            let stored = match self.store.get(key).await {
                Ok(Some(stored)) => stored,
                Ok(None) => continue,
                Err(SettingsError::SerializationError(e)) => {
                    warn!(key, error = %e, "ignoring undecodable stored setting");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut candidate = merged.clone();
            candidate.insert(key.to_string(), stored);
            if from_object(candidate.clone()).is_ok() {
                merged = candidate;
            } else {
                warn!(key, "ignoring malformed stored setting");
            }
        }

        self.settings = from_object(merged)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        debug!(settings = ?self.settings, "settings loaded");
        Ok(self.settings.clone())
    }

    async fn save(&self) -> Result<(), SettingsError> {
        for (key, value) in to_object(&self.settings)? {
            self.store.set(&key, value).await?;
        }
        Ok(())
    }

    fn get_settings(&self) -> &OverviewSettings {
        &self.settings
    }

    /// Updates one top-level key, validated by a serde round-trip, and persists it.
    async fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        if !OverviewSettings::KEYS.contains(&key) {
            return Err(SettingsError::InvalidKey(format!(
                "Key '{}' not found in settings",
                key
            )));
        }

        let mut map = to_object(&self.settings)?;
        map.insert(key.to_string(), value.clone());
        let updated = from_object(map).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.store.set(key, value).await?;
        self.settings = updated;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = OverviewSettings::default();
        self.save().await
    }
}

// === Geometry and window-id helpers ===
//
// Used by the lifecycle controller, which only touches these two keys.

pub async fn read_bounds(store: &dyn KeyValueStore) -> Result<Option<WindowBounds>, SettingsError> {
    match store.get(BOUNDS_KEY).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(bounds) => Ok(Some(bounds)),
            Err(e) => {
                warn!(error = %e, "ignoring malformed stored bounds");
                Ok(None)
            }
        },
    }
}

pub async fn write_bounds(store: &dyn KeyValueStore, bounds: WindowBounds) -> Result<(), SettingsError> {
    let value = serde_json::to_value(bounds)
        .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
    store.set(BOUNDS_KEY, value).await
}

pub async fn clear_bounds(store: &dyn KeyValueStore) -> Result<(), SettingsError> {
    store.set(BOUNDS_KEY, Value::Null).await
}

pub async fn read_window_id(store: &dyn KeyValueStore) -> Result<Option<WindowId>, SettingsError> {
    Ok(store.get(WINDOW_ID_KEY).await?.and_then(|v| v.as_i64()))
}

pub async fn write_window_id(store: &dyn KeyValueStore, window_id: WindowId) -> Result<(), SettingsError> {
    store.set(WINDOW_ID_KEY, Value::from(window_id)).await
}

pub async fn clear_window_id(store: &dyn KeyValueStore) -> Result<(), SettingsError> {
    store.remove(WINDOW_ID_KEY).await
}
