//! Device storage: trait plus JSON file implementation.
//!
//! The whole device list is one JSON array, rewritten in full on every save.
//! The write goes straight to the target path; a crash mid-write can leave a
//! truncated file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use wolweb_core::Device;

/// Errors that can occur while reading or writing the device store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for device persistence backends.
pub trait DeviceStore: Send + Sync {
    /// Read the full device list. A missing backing record is an empty list.
    fn load(&self) -> Result<Vec<Device>, StoreError>;

    /// Replace the backing record with `devices`.
    fn save(&self, devices: &[Device]) -> Result<(), StoreError>;
}

/// File-system backed store holding a pretty-printed JSON array.
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

impl DeviceStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Device>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Device store not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let devices: Vec<Device> = serde_json::from_str(&json)?;
        tracing::debug!(path = %self.path.display(), count = devices.len(), "Device store loaded");
        Ok(devices)
    }

    fn save(&self, devices: &[Device]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(devices)?;
        fs::write(&self.path, json)?;

        tracing::debug!(path = %self.path.display(), count = devices.len(), "Device store saved");
        Ok(())
    }
}
