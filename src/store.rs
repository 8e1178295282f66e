//! Durable storage for the configuration record.
//!
//! The record lives in a single JSON file. A missing file is a normal first
//! boot and reads as the default record; a file that exists but does not
//! parse is a hard failure, since a corrupt config is indistinguishable
//! from tampering and is surfaced instead of guessed at.
//!
//! Writes go to a sibling staging file which is read back, verified, and
//! renamed over the destination, so a power loss mid-write leaves either the
//! old record or the new one but never a torn file.

use crate::config::DeviceConfig;
use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the record lives on the device's flash filesystem.
#[cfg(feature = "esp32")]
pub const DEVICE_CONFIG_PATH: &str = "/spiffs/config.json";

/// File-backed store for the [`DeviceConfig`] record.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store over the given file path. Nothing is touched until
    /// [`load`](Self::load) or [`save`](Self::save).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record from storage.
    ///
    /// A missing file returns the default (empty) record. Anything stored
    /// that fails to parse returns [`StoreError::Malformed`].
    pub fn load(&self) -> Result<DeviceConfig, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file at {:?}, starting empty", self.path);
                return Ok(DeviceConfig::default());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        serde_json::from_str(&text).map_err(StoreError::Malformed)
    }

    /// Overwrite the stored record.
    ///
    /// The serialized record is written to a staging file, read back to
    /// catch silent write failures, then renamed over the real path.
    pub fn save(&self, config: &DeviceConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string(config).map_err(StoreError::Malformed)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = self.staging_path();
        fs::write(&staging, &json)?;

        let read_back = fs::read_to_string(&staging)?;
        if read_back != json {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "config verification failed: wrote {} bytes, read {} bytes",
                    json.len(),
                    read_back.len()
                ),
            )));
        }

        fs::rename(&staging, &self.path)?;
        info!("config saved to {:?}", self.path);
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("config.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Errors from reading or writing the record.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure.
    Io(io::Error),
    /// The stored record exists but does not parse as a config document.
    Malformed(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config storage I/O error: {}", e),
            Self::Malformed(e) => write!(f, "stored config is malformed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Malformed(e) => Some(e),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Mount the SPIFFS partition that holds the config record and the portal's
/// form page. Formats the partition on first boot.
#[cfg(feature = "esp32")]
pub fn mount_flash() -> Result<(), esp_idf_sys::EspError> {
    let conf = esp_idf_sys::esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    esp_idf_sys::esp!(unsafe { esp_idf_sys::esp_vfs_spiffs_register(&conf) })?;
    info!("SPIFFS mounted at /spiffs");
    Ok(())
}
