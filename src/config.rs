//! The persisted configuration record.
//!
//! One flat JSON document holds everything the device remembers across
//! boots: the WiFi network it should join, and the identity of the fallback
//! hotspot it opens when it can't.
//!
//! # Example
//!
//! ```
//! use bauble_esp32::config::DeviceConfig;
//!
//! let config: DeviceConfig = serde_json::from_str(
//!     r#"{"wifi":{"ssid":"home","password":"hunter22"}}"#,
//! ).unwrap();
//! assert!(config.wifi.is_complete());
//! assert_eq!(config.hotspot.ssid, ""); // absent sections read as empty
//! ```

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// An SSID/password pair.
///
/// An empty `ssid` means "not configured". The two fields are only ever
/// cleared together, via [`DeviceConfig::clear_wifi`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Credentials {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// Both fields non-empty.
    ///
    /// This is the station connector's precondition: it will not touch the
    /// radio without a complete pair.
    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.password.is_empty()
    }
}

/// The whole persisted record.
///
/// Partial or missing sections deserialize to empty strings rather than
/// failing; the file may predate a field or not exist at all on first boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Network to join in station mode.
    #[serde(default)]
    pub wifi: Credentials,
    /// Fallback access-point identity. Ships with the image and is not
    /// modified at runtime.
    #[serde(default)]
    pub hotspot: Credentials,
}

impl DeviceConfig {
    /// Erase the stored WiFi credentials, both fields at once.
    ///
    /// Used by the station connector when the radio rejects the pair at
    /// setup time, so a corrupt pair cannot wedge the device in a
    /// connect/restart loop.
    pub fn clear_wifi(&mut self) {
        self.wifi.zeroize();
    }
}
