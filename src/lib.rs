//! Bauble ESP32 firmware library.
//!
//! Firmware for an addressable-LED ornament with one capacitive touch
//! input. The device joins a stored WiFi network on boot; when it can't,
//! it opens a fallback access point with a captive config portal, persists
//! whatever credentials the operator submits, and restarts to try again.
//!
//! The provisioning machine is platform-independent and tested on the host;
//! only the radio, the touch pad, and the LED strip are ESP32-specific.

pub mod boot;
pub mod config;
pub mod light;
pub mod net;
pub mod portal;
pub mod station;
pub mod store;
#[cfg(feature = "esp32")]
pub mod touch;

// Re-export commonly used items
pub use config::{Credentials, DeviceConfig};
pub use net::{AccessPoint, NetError, Restart, Station};
pub use portal::ConfigPortal;
pub use station::ConnectOutcome;
pub use store::{ConfigStore, StoreError};
