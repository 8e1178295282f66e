//! Radio and restart seams.
//!
//! The station and access-point interfaces are process-wide singletons in
//! the hardware, but the provisioning logic takes them as explicit handles
//! so every branch is testable with a double. The boot sequencer owns the
//! handles for the lifetime of a boot cycle.
//!
//! # Components
//!
//! - [`Station`] / [`AccessPoint`] - the two radio roles
//! - [`Restart`] - the terminal "apply configuration, then restart" exit
//! - [`poll_until`] / [`poll_until_deadline`] - bounded-interval polling in
//!   place of the busy-waits the hardware APIs invite

use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "esp32")]
mod esp;

#[cfg(feature = "esp32")]
pub use esp::{EspRadio, EspRestart};

/// Client-mode side of the radio.
pub trait Station {
    /// Start joining `ssid`. Returns once the attempt is in flight.
    ///
    /// An error here is a setup-time rejection (malformed credentials,
    /// radio fault): the attempt never started, and the caller treats the
    /// credential pair as bad.
    fn begin_join(&mut self, ssid: &str, password: &str) -> Result<(), NetError>;

    /// Whether a started join has completed.
    fn is_connected(&self) -> bool;
}

/// Access-point side of the radio.
pub trait AccessPoint {
    /// Configure and start the access point with the given identity.
    fn activate(&mut self, ssid: &str, password: &str) -> Result<(), NetError>;

    /// Whether the access point is up.
    fn is_active(&self) -> bool;

    /// Whether at least one client has associated.
    fn has_client(&self) -> bool;
}

/// Full device restart, the provisioning machine's only way out.
pub trait Restart {
    fn restart(&self) -> !;
}

/// Errors from the radio.
#[derive(Debug)]
pub enum NetError {
    /// The SSID or password cannot be given to the radio (too long,
    /// unrepresentable).
    InvalidCredentials,
    /// Failure reported by the underlying driver.
    Driver(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Driver(msg) => write!(f, "radio driver error: {}", msg),
        }
    }
}

impl std::error::Error for NetError {}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for NetError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Driver(format!("{:?}", e))
    }
}

/// Block until `pred` holds, checking every `interval`.
pub fn poll_until(interval: Duration, mut pred: impl FnMut() -> bool) {
    while !pred() {
        std::thread::sleep(interval);
    }
}

/// Block until `pred` holds or `deadline` passes, checking every `interval`.
///
/// Returns `true` if the predicate held before the deadline.
pub fn poll_until_deadline(
    deadline: Instant,
    interval: Duration,
    mut pred: impl FnMut() -> bool,
) -> bool {
    loop {
        if pred() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(interval);
    }
}
