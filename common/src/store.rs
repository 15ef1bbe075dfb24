// Self-healing JSON store for the device configuration
//
// One file, one record. A read that fails for any reason resets the file to
// defaults instead of propagating, so the service always has a usable
// configuration to schedule from. Strictness lives on the save path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{SaveError, StoreError};
use crate::models::{ConfigPatch, DeviceConfig};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with defaults when it does not exist yet.
    pub fn ensure(&self) -> Result<DeviceConfig, StoreError> {
        if self.path.exists() {
            return self.load();
        }
        tracing::info!(path = %self.path.display(), "Config file missing, writing defaults");
        let config = DeviceConfig::default();
        self.persist(&config)?;
        Ok(config)
    }

    /// Load the configuration, resetting the file to defaults when it cannot
    /// be read or parsed. Only a failure to write the reset file propagates.
    pub fn load(&self) -> Result<DeviceConfig, StoreError> {
        match self.try_load() {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Config file unreadable, resetting to defaults"
                );
                let config = DeviceConfig::default();
                self.persist(&config)?;
                Ok(config)
            }
        }
    }

    /// Validate a patch, merge it over the stored record and overwrite the
    /// file. Validation failures leave the file untouched.
    ///
    /// Load-merge-write is not atomic across processes; concurrent saves
    /// resolve as last writer wins.
    pub fn save(&self, patch: &ConfigPatch) -> Result<DeviceConfig, SaveError> {
        let errors = patch.validate();
        if !errors.is_empty() {
            return Err(SaveError::Validation(errors));
        }

        let current = self.load().map_err(SaveError::Store)?;
        let merged = current.merged(patch);
        self.persist(&merged).map_err(SaveError::Store)?;
        tracing::info!(path = %self.path.display(), "Config saved");
        Ok(merged)
    }

    fn try_load(&self) -> Result<DeviceConfig, StoreError> {
        let raw = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    fn persist(&self, config: &DeviceConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pretty = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, pretty)?;
        Ok(())
    }
}
