//! Capacitive touch input.
//!
//! Thin wrapper over the ESP-IDF touch-pad driver. Readings drop when the
//! pad is touched; the light loop maps them to brightness and simply skips
//! a frame when a read fails.

use esp_idf_sys::{esp, touch_pad_t, EspError};

/// Touch pad 0, which is GPIO4 on the ESP32.
pub const ORNAMENT_PAD: touch_pad_t = esp_idf_sys::touch_pad_t_TOUCH_PAD_NUM0;

/// One configured touch pad.
pub struct TouchPad {
    pad: touch_pad_t,
}

impl TouchPad {
    /// Initialize the touch driver and configure `pad` for raw reads.
    pub fn new(pad: touch_pad_t) -> Result<Self, EspError> {
        esp!(unsafe { esp_idf_sys::touch_pad_init() })?;
        // Threshold 0: we poll raw values, no interrupt wakeups.
        esp!(unsafe { esp_idf_sys::touch_pad_config(pad, 0) })?;
        Ok(Self { pad })
    }

    /// Raw counter value; lower means touched.
    pub fn read(&self) -> Result<u16, EspError> {
        let mut value: u16 = 0;
        esp!(unsafe { esp_idf_sys::touch_pad_read(self.pad, &mut value) })?;
        Ok(value)
    }
}
