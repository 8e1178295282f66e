//! Station connector: one bounded attempt to get online as a WiFi client.
//!
//! The connector never retries. If the join does not complete inside the
//! deadline the caller falls back to the config portal, and the next attempt
//! happens on the next boot cycle.
//!
//! A setup-time rejection from the radio is treated differently from a
//! timeout: rejection means the stored pair itself is bad, so it is erased
//! and the erasure persisted; a timeout may just be a network that is
//! momentarily out of reach, so the credentials are kept for a later retry.

use crate::config::DeviceConfig;
use crate::net::{poll_until_deadline, Station};
use crate::store::{ConfigStore, StoreError};
use log::{info, warn};
use std::time::{Duration, Instant};

/// Wall-clock budget for one join attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the connection status is polled while waiting.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How one connection attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Online before the deadline.
    Connected,
    /// No stored credentials; the radio was never touched.
    NoCredentials,
    /// The radio rejected the credentials at setup time. The stored pair
    /// has been erased.
    Rejected,
    /// The deadline passed without a connection. Stored credentials are
    /// untouched.
    TimedOut,
}

impl ConnectOutcome {
    /// Whether the device is online and provisioning can be skipped.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Attempt one join with the production deadline.
pub fn connect(
    station: &mut impl Station,
    config: &mut DeviceConfig,
    store: &ConfigStore,
) -> Result<ConnectOutcome, StoreError> {
    connect_with_timeout(station, config, store, CONNECT_TIMEOUT)
}

/// Attempt one join, waiting at most `timeout` from attempt start.
pub fn connect_with_timeout(
    station: &mut impl Station,
    config: &mut DeviceConfig,
    store: &ConfigStore,
    timeout: Duration,
) -> Result<ConnectOutcome, StoreError> {
    if !config.wifi.is_complete() {
        info!("no WiFi credentials configured");
        return Ok(ConnectOutcome::NoCredentials);
    }

    let deadline = Instant::now() + timeout;

    info!("connecting to WiFi: {}", config.wifi.ssid);
    if let Err(e) = station.begin_join(&config.wifi.ssid, &config.wifi.password) {
        warn!("join rejected ({}), erasing stored credentials", e);
        config.clear_wifi();
        store.save(config)?;
        return Ok(ConnectOutcome::Rejected);
    }

    if poll_until_deadline(deadline, STATUS_POLL_INTERVAL, || station.is_connected()) {
        info!("WiFi connected");
        Ok(ConnectOutcome::Connected)
    } else {
        warn!("WiFi connection timed out");
        Ok(ConnectOutcome::TimedOut)
    }
}
