/// Persisted alert preferences
///
/// Settings are one flat JSON object, read once at startup and rewritten
/// on every change. There is no schema versioning.
use crate::error::{AppError, Result};
use crate::models::AlertSettings;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<AlertSettings>>;
    fn save(&self, settings: &AlertSettings) -> Result<()>;
}

/// Load settings, falling back to defaults on a missing or unreadable store
///
/// Loaded values are clamped the same way updates are.
pub fn load_or_default(store: &dyn SettingsStore) -> AlertSettings {
    match store.load() {
        Ok(Some(settings)) => {
            let normalized = settings.clone().normalized();
            if normalized != settings {
                tracing::warn!("Saved alert settings out of range, clamped");
            }
            normalized
        }
        Ok(None) => {
            tracing::info!("No saved alert settings, using defaults");
            AlertSettings::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load alert settings, using defaults");
            AlertSettings::default()
        }
    }
}

/// Store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<AlertSettings>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let settings = serde_json::from_str(&raw)?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &AlertSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved alert settings");
        Ok(())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<AlertSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AlertSettings) -> Self {
        Self {
            saved: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<AlertSettings>> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| AppError::Store("settings lock poisoned".to_string()))?;
        Ok(saved.clone())
    }

    fn save(&self, settings: &AlertSettings) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| AppError::Store("settings lock poisoned".to_string()))?;
        *saved = Some(settings.clone());
        Ok(())
    }
}
